//! Central catalog of parameterized graph queries, grouped by entity
//! family. This module is the only place query text lives; repositories
//! invoke entries by name with parameters.

pub mod params;

/// Reusable graph-pattern fragments, notably the Nomen → LocalizedText
/// subpattern parameterized by node alias and relationship label.
pub mod fragments {
    /// Projects the primary `Nomen` reached from `alias` over `rel` into
    /// `{language, text}` entries. The language is the full BCP-47 tag kept
    /// on the `HAS_LANGUAGE` edge, falling back to the directory base code.
    pub fn primary_nomen(alias: &str, rel: &str) -> String {
        format!(
            "({alias})-[:{rel}]->({alias}_n:Nomen)-[:HAS_LOCALIZATION]->\
             ({alias}_lt:LocalizedText)-[{alias}_hl:HAS_LANGUAGE]->({alias}_l:Language) | {{\
                 language: coalesce({alias}_hl.bcp47, {alias}_l.code),\
                 text: {alias}_lt.text\
             }}"
        )
    }

    /// Projects every alternative `Nomen` attached to the primary one as a
    /// nested list of `{language, text}` entries.
    pub fn alternative_nomen(alias: &str, rel: &str) -> String {
        format!(
            "({alias})-[:{rel}]->(:Nomen)<-[:ALTERNATIVE_OF]-({alias}_an:Nomen) | [\
                 ({alias}_an)-[:HAS_LOCALIZATION]->({alias}_at:LocalizedText)\
                 -[{alias}_ahl:HAS_LANGUAGE]->({alias}_al:Language) | {{\
                     language: coalesce({alias}_ahl.bcp47, {alias}_al.code),\
                     text: {alias}_at.text\
                 }}\
             ]"
        )
    }
}

pub mod nomens {
    pub const CREATE: &str = "
    CREATE (nomen:Nomen {id: $nomen_id})
    WITH nomen
    OPTIONAL MATCH (primary:Nomen {id: $primary_nomen_id})
    FOREACH (_ IN CASE WHEN primary IS NOT NULL THEN [1] ELSE [] END |
        CREATE (nomen)-[:ALTERNATIVE_OF]->(primary))
    FOREACH (lt IN $localized_texts |
        MERGE (language:Language {code: lt.base_lang_code})
        CREATE (nomen)-[:HAS_LOCALIZATION]->(:LocalizedText {text: lt.text})
            -[:HAS_LANGUAGE {bcp47: lt.bcp47_tag}]->(language))
    RETURN nomen.id AS nomen_id
    ";

    /// Merge semantics for the title PUT: existing localizations for a
    /// language are rewritten, untouched languages stay.
    pub const MERGE_EXPRESSION_TITLE: &str = "
    MATCH (expression:Expression {id: $expression_id})-[:HAS_TITLE]->(nomen:Nomen)
    UNWIND $localized_texts AS lt
    MERGE (language:Language {code: lt.base_lang_code})
    WITH nomen, lt, language
    OPTIONAL MATCH (nomen)-[:HAS_LOCALIZATION]->(existing:LocalizedText)-[:HAS_LANGUAGE]->(language)
    FOREACH (text IN CASE WHEN existing IS NOT NULL THEN [existing] ELSE [] END |
        SET text.text = lt.text)
    FOREACH (_ IN CASE WHEN existing IS NULL THEN [1] ELSE [] END |
        CREATE (nomen)-[:HAS_LOCALIZATION]->(:LocalizedText {text: lt.text})
            -[:HAS_LANGUAGE {bcp47: lt.bcp47_tag}]->(language))
    RETURN nomen.id AS nomen_id
    ";
}

pub mod expressions {
    use super::fragments;

    fn projection() -> String {
        format!(
            "{{
        id: expression.id,
        bdrc: expression.bdrc,
        wiki: expression.wiki,
        type: expression.type,
        date: expression.date,
        language: expression.language,
        copyright: expression.copyright,
        license: [(expression)-[:HAS_LICENSE]->(license_t:LicenseType) | license_t.name][0],
        title: [{title}],
        alt_titles: [{alt_titles}],
        contributions: [(expression)-[contrib:CONTRIBUTED_BY]->(agent) | {{
            role: contrib.role,
            person_id: CASE WHEN 'Person' IN labels(agent) THEN agent.id ELSE null END,
            person_bdrc_id: CASE WHEN 'Person' IN labels(agent) THEN agent.bdrc ELSE null END,
            ai_id: CASE WHEN 'AI' IN labels(agent) THEN agent.id ELSE null END
        }}],
        target: coalesce(
            [(expression)-[:TRANSLATION_OF]->(target_e:Expression) | target_e.id][0],
            [(expression)-[:COMMENTARY_OF]->(target_e:Expression) | target_e.id][0]),
        category_id: [(expression)-[:EXPRESSION_OF]->(:Work)-[:HAS_CATEGORY]->(cat:Category) | cat.id][0]
    }} AS expression",
            title = fragments::primary_nomen("expression", "HAS_TITLE"),
            alt_titles = fragments::alternative_nomen("expression", "HAS_TITLE"),
        )
    }

    pub fn fetch_by_id() -> String {
        format!(
            "MATCH (expression:Expression {{id: $id}})\n    RETURN {}",
            projection()
        )
    }

    pub fn fetch_by_bdrc() -> String {
        format!(
            "MATCH (expression:Expression {{bdrc: $bdrc_id}})\n    RETURN {}",
            projection()
        )
    }

    pub fn fetch_all() -> String {
        format!(
            "MATCH (expression:Expression)
    WHERE ($type IS NULL OR expression.type = $type)
      AND ($language IS NULL OR expression.language_code = $language)
      AND ($title IS NULL OR EXISTS {{
            MATCH (expression)-[:HAS_TITLE]->(:Nomen)-[:HAS_LOCALIZATION]->(lt:LocalizedText)
            WHERE toLower(lt.text) CONTAINS toLower($title)
          }})
    WITH expression
    ORDER BY expression.id
    SKIP $offset LIMIT $limit
    RETURN {}",
            projection()
        )
    }

    pub const CREATE_STANDALONE: &str = "
    MATCH (language:Language {code: $language_code})
    MATCH (license_t:LicenseType {name: $license})
    MATCH (title:Nomen {id: $title_nomen_id})
    CREATE (work:Work {id: $work_id})
    CREATE (expression:Expression {
        id: $expression_id, bdrc: $bdrc, wiki: $wiki, type: $type, date: $date,
        language: $bcp47_tag, language_code: $language_code, copyright: $copyright
    })
    CREATE (expression)-[:EXPRESSION_OF {original: $original}]->(work)
    CREATE (expression)-[:HAS_TITLE]->(title)
    CREATE (expression)-[:HAS_LANGUAGE {bcp47: $bcp47_tag}]->(language)
    CREATE (expression)-[:HAS_LICENSE]->(license_t)
    RETURN expression.id AS expression_id
    ";

    pub const CREATE_TRANSLATION: &str = "
    MATCH (language:Language {code: $language_code})
    MATCH (license_t:LicenseType {name: $license})
    MATCH (title:Nomen {id: $title_nomen_id})
    MATCH (target:Expression {id: $target_id})
    CREATE (work:Work {id: $work_id})
    CREATE (expression:Expression {
        id: $expression_id, bdrc: $bdrc, wiki: $wiki, type: $type, date: $date,
        language: $bcp47_tag, language_code: $language_code, copyright: $copyright
    })
    CREATE (expression)-[:EXPRESSION_OF {original: false}]->(work)
    CREATE (expression)-[:TRANSLATION_OF]->(target)
    CREATE (expression)-[:HAS_TITLE]->(title)
    CREATE (expression)-[:HAS_LANGUAGE {bcp47: $bcp47_tag}]->(language)
    CREATE (expression)-[:HAS_LICENSE]->(license_t)
    RETURN expression.id AS expression_id
    ";

    pub const CREATE_COMMENTARY: &str = "
    MATCH (language:Language {code: $language_code})
    MATCH (license_t:LicenseType {name: $license})
    MATCH (title:Nomen {id: $title_nomen_id})
    MATCH (target:Expression {id: $target_id})
    CREATE (work:Work {id: $work_id})
    CREATE (expression:Expression {
        id: $expression_id, bdrc: $bdrc, wiki: $wiki, type: $type, date: $date,
        language: $bcp47_tag, language_code: $language_code, copyright: $copyright
    })
    CREATE (expression)-[:EXPRESSION_OF {original: false}]->(work)
    CREATE (expression)-[:COMMENTARY_OF]->(target)
    CREATE (expression)-[:HAS_TITLE]->(title)
    CREATE (expression)-[:HAS_LANGUAGE {bcp47: $bcp47_tag}]->(language)
    CREATE (expression)-[:HAS_LICENSE]->(license_t)
    RETURN expression.id AS expression_id
    ";

    pub const CREATE_CONTRIBUTION: &str = "
    MATCH (expression:Expression {id: $expression_id})
    MATCH (role:RoleType {name: $role_name})
    OPTIONAL MATCH (by_id:Person {id: $person_id})
    OPTIONAL MATCH (by_bdrc:Person {bdrc: $person_bdrc_id})
    WITH expression, role, coalesce(by_id, by_bdrc) AS person
    WHERE person IS NOT NULL
    CREATE (expression)-[:CONTRIBUTED_BY {role: role.name}]->(person)
    RETURN person.id AS person_id
    ";

    pub const CREATE_AI_CONTRIBUTION: &str = "
    MATCH (expression:Expression {id: $expression_id})
    MATCH (role:RoleType {name: $role_name})
    MERGE (ai:AI {id: $ai_id})
    CREATE (expression)-[:CONTRIBUTED_BY {role: role.name}]->(ai)
    RETURN ai.id AS ai_id
    ";

    pub const LINK_WORK_TO_CATEGORY: &str = "
    MATCH (expression:Expression {id: $expression_id})-[:EXPRESSION_OF]->(work:Work)
    MATCH (category:Category {id: $category_id})
    CREATE (work)-[:HAS_CATEGORY]->(category)
    RETURN work.id AS work_id
    ";

    pub const IDS_BY_MANIFESTATION_IDS: &str = "
    UNWIND $manifestation_ids AS manifestation_id
    MATCH (m:Manifestation {id: manifestation_id})-[:MANIFESTATION_OF]->(e:Expression)
    RETURN manifestation_id, e.id AS expression_id
    ";
}

pub mod manifestations {
    use super::fragments;

    fn projection() -> String {
        format!(
            "{{
        id: manifestation.id,
        bdrc: manifestation.bdrc,
        wiki: manifestation.wiki,
        type: manifestation.type,
        source: manifestation.source,
        colophon: manifestation.colophon,
        incipit_title: [{incipit}],
        alt_incipit_titles: [{alt_incipit}],
        annotations: [(manifestation)<-[:SEGMENTATION_OF]-(layer:Segmentation) | {{
            id: layer.id, type: layer.kind
        }}]
    }} AS manifestation",
            incipit = fragments::primary_nomen("manifestation", "HAS_INCIPIT_TITLE"),
            alt_incipit = fragments::alternative_nomen("manifestation", "HAS_INCIPIT_TITLE"),
        )
    }

    /// One query serves lookup by manifestation id and listing by
    /// expression id with an optional type filter.
    pub fn fetch() -> String {
        format!(
            "MATCH (manifestation:Manifestation)-[:MANIFESTATION_OF]->(expression:Expression)
    WHERE ($manifestation_id IS NOT NULL AND manifestation.id = $manifestation_id)
       OR ($expression_id IS NOT NULL AND expression.id = $expression_id
           AND ($manifestation_type IS NULL OR manifestation.type = $manifestation_type))
    WITH manifestation, expression
    ORDER BY manifestation.id
    RETURN {}, expression.id AS expression_id",
            projection()
        )
    }

    pub const CREATE: &str = "
    MATCH (expression:Expression {id: $expression_id})
    CREATE (manifestation:Manifestation {
        id: $manifestation_id, bdrc: $bdrc, wiki: $wiki, type: $type,
        source: $source, colophon: $colophon
    })
    CREATE (manifestation)-[:MANIFESTATION_OF]->(expression)
    WITH manifestation
    OPTIONAL MATCH (incipit:Nomen {id: $incipit_nomen_id})
    FOREACH (_ IN CASE WHEN incipit IS NOT NULL THEN [1] ELSE [] END |
        CREATE (manifestation)-[:HAS_INCIPIT_TITLE]->(incipit))
    RETURN manifestation.id AS manifestation_id
    ";

    pub const UPDATE_PROPERTIES: &str = "
    MATCH (manifestation:Manifestation {id: $manifestation_id})
    SET manifestation.bdrc = $bdrc,
        manifestation.wiki = $wiki,
        manifestation.colophon = $colophon,
        manifestation.type = $type,
        manifestation.source = $source
    WITH manifestation
    OPTIONAL MATCH (incipit:Nomen {id: $incipit_nomen_id})
    FOREACH (_ IN CASE WHEN incipit IS NOT NULL THEN [1] ELSE [] END |
        CREATE (manifestation)-[:HAS_INCIPIT_TITLE]->(incipit))
    RETURN manifestation.id AS manifestation_id
    ";

    /// Detaches and deletes the incipit Nomen subgraph ahead of an update.
    pub const CLEANUP_INCIPIT: &str = "
    MATCH (manifestation:Manifestation {id: $manifestation_id})
    OPTIONAL MATCH (manifestation)-[:HAS_INCIPIT_TITLE]->(nomen:Nomen)
    OPTIONAL MATCH (alt:Nomen)-[:ALTERNATIVE_OF]->(nomen)
    OPTIONAL MATCH (nomen)-[:HAS_LOCALIZATION]->(text:LocalizedText)
    OPTIONAL MATCH (alt)-[:HAS_LOCALIZATION]->(alt_text:LocalizedText)
    DETACH DELETE text, alt_text, alt, nomen
    ";

    /// Segment ids per layer family, partitioned so the caller can tell the
    /// indexer which search segments went away.
    pub const GATHER_SEGMENT_IDS: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
    OPTIONAL MATCH (m)<-[:SEGMENTATION_OF]-(:Segmentation {kind: 'search_segmentation'})
        <-[:SEGMENT_OF]-(search_segment:Segment)
    WITH m, collect(DISTINCT search_segment.id) AS search_segmentation_ids
    OPTIONAL MATCH (m)<-[:SEGMENTATION_OF]-(layer:Segmentation)<-[:SEGMENT_OF]-(segment:Segment)
    WHERE layer.kind <> 'search_segmentation'
    RETURN search_segmentation_ids, collect(DISTINCT segment.id) AS segmentation_ids
    ";

    /// Deletes whole Segmentation layers (segments, spans, page references)
    /// whose kind is in `$kinds`.
    pub const DELETE_LAYERS_BY_KIND: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(layer:Segmentation)
    WHERE layer.kind IN $kinds
    OPTIONAL MATCH (layer)<-[:SEGMENT_OF]-(segment:Segment)
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(segment)
    OPTIONAL MATCH (segment)-[:HAS_REFERENCE]->(reference:Reference)
    DETACH DELETE span, reference, segment, layer
    ";

    pub const DELETE_NOTES: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:NOTE_OF]-(note:Note)
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(note)
    DETACH DELETE span, note
    ";

    pub const DELETE_BIBLIOGRAPHY: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:BIBLIOGRAPHY_OF]-(bib:BibliographicMetadata)
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(bib)
    DETACH DELETE span, bib
    ";

    pub const FIND_RELATED_VIA_ALIGNMENT: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(own:Segmentation {kind: 'alignment'})
    MATCH (own)<-[:SEGMENT_OF]-(:Segment)-[:ALIGNED_TO]-(:Segment)
        -[:SEGMENT_OF]->(peer_layer:Segmentation)-[:SEGMENTATION_OF]->(peer:Manifestation)
    MATCH (peer)-[:MANIFESTATION_OF]->(peer_expression:Expression)
    WHERE peer.id <> $manifestation_id
    RETURN DISTINCT peer.id AS manifestation_id,
        peer_expression.id AS expression_id,
        own.id AS alignment_id
    ";

    pub const FIND_RELATED_VIA_EXPRESSION: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})-[:MANIFESTATION_OF]->(e:Expression)
    MATCH (e)-[:TRANSLATION_OF|COMMENTARY_OF]-(other:Expression)
    MATCH (peer:Manifestation)-[:MANIFESTATION_OF]->(other)
    RETURN DISTINCT peer.id AS manifestation_id, other.id AS expression_id
    ";
}

pub mod segmentations {
    /// Creates one Segmentation layer of `$kind` with its segments and
    /// spans; returns no row when the manifestation is missing.
    pub const CREATE: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
    CREATE (segmentation:Segmentation {id: $segmentation_id, kind: $kind})-[:SEGMENTATION_OF]->(m)
    WITH segmentation
    UNWIND $segments AS segment_data
    CREATE (segment:Segment {id: segment_data.id})-[:SEGMENT_OF]->(segmentation)
    FOREACH (line IN segment_data.lines |
        CREATE (:Span {start: line.start, end: line.end})-[:SPAN_OF]->(segment))
    RETURN count(*) AS segment_count
    ";

    /// Lookup by layer id, or by manifestation + kind. Spans are ordered by
    /// `start` within a segment, segments by their minimal span start.
    pub const FETCH: &str = "
    MATCH (segmentation:Segmentation)-[:SEGMENTATION_OF]->(manifestation:Manifestation)
    WHERE ($segmentation_id IS NOT NULL AND segmentation.id = $segmentation_id)
       OR ($manifestation_id IS NOT NULL AND manifestation.id = $manifestation_id
           AND segmentation.kind = $kind)
    MATCH (manifestation)-[:MANIFESTATION_OF]->(expression:Expression)
    MATCH (segment:Segment)-[:SEGMENT_OF]->(segmentation)
    MATCH (span:Span)-[:SPAN_OF]->(segment)
    OPTIONAL MATCH (segment)-[:HAS_REFERENCE]->(reference:Reference)
    WITH segmentation, manifestation, expression, segment, reference, span
    ORDER BY span.start
    WITH segmentation, manifestation, expression, segment, reference,
         min(span.start) AS min_start,
         collect({start: span.start, end: span.end}) AS lines
    ORDER BY min_start
    WITH segmentation, manifestation, expression,
         collect({id: segment.id, reference: reference.name, lines: lines}) AS segments
    RETURN segmentation.id AS id, segmentation.kind AS kind,
           manifestation.id AS manifestation_id, expression.id AS expression_id, segments
    ";

    /// Unconditional layer delete; a no-op when the id does not match.
    pub const DELETE: &str = "
    MATCH (segmentation:Segmentation {id: $segmentation_id})
    OPTIONAL MATCH (segmentation)<-[:SEGMENT_OF]-(segment:Segment)
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(segment)
    OPTIONAL MATCH (segment)-[:HAS_REFERENCE]->(reference:Reference)
    DETACH DELETE span, reference, segment, segmentation
    ";

    /// Existence plus the aligned peer layer, when the segmentation is one
    /// side of an alignment.
    pub const ALIGNMENT_PEER: &str = "
    OPTIONAL MATCH (layer:Segmentation {id: $segmentation_id})
    OPTIONAL MATCH (layer)<-[:SEGMENT_OF]-(:Segment)-[:ALIGNED_TO]-(:Segment)
        -[:SEGMENT_OF]->(peer:Segmentation)
    RETURN layer IS NOT NULL AS exists, peer.id AS aligned_segmentation_id
    ";

    pub const MANIFESTATION_OF: &str = "
    MATCH (layer:Segmentation {id: $segmentation_id})-[:SEGMENTATION_OF]->(m:Manifestation)
    RETURN m.id AS manifestation_id, layer.kind AS kind
    ";
}

pub mod paginations {
    /// As `segmentations::CREATE`, plus one Reference (page label) per
    /// segment.
    pub const CREATE: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
    CREATE (segmentation:Segmentation {id: $segmentation_id, kind: 'pagination'})-[:SEGMENTATION_OF]->(m)
    WITH segmentation
    UNWIND $segments AS segment_data
    CREATE (segment:Segment {id: segment_data.id})-[:SEGMENT_OF]->(segmentation)
    CREATE (segment)-[:HAS_REFERENCE]->(:Reference {id: segment_data.reference_id, name: segment_data.reference})
    FOREACH (line IN segment_data.lines |
        CREATE (:Span {start: line.start, end: line.end})-[:SPAN_OF]->(segment))
    RETURN count(*) AS segment_count
    ";
}

pub mod alignments {
    /// Creates both sibling Segmentations with their segments and spans,
    /// then all cross edges by id lookup, in one statement.
    pub const CREATE: &str = "
    MATCH (source_manifestation:Manifestation {id: $manifestation_id}),
          (target_manifestation:Manifestation {id: $target_manifestation_id})
    CREATE (source_segmentation:Segmentation {id: $source_segmentation_id, kind: 'alignment'})
        -[:SEGMENTATION_OF]->(source_manifestation),
           (target_segmentation:Segmentation {id: $target_segmentation_id, kind: 'alignment'})
        -[:SEGMENTATION_OF]->(target_manifestation)
    WITH source_segmentation, target_segmentation
    UNWIND $target_segments AS target_segment_data
    CREATE (segment:Segment {id: target_segment_data.id})-[:SEGMENT_OF]->(target_segmentation)
    FOREACH (line IN target_segment_data.lines |
        CREATE (:Span {start: line.start, end: line.end})-[:SPAN_OF]->(segment))
    WITH source_segmentation
    UNWIND $source_segments AS source_segment_data
    CREATE (segment:Segment {id: source_segment_data.id})-[:SEGMENT_OF]->(source_segmentation)
    FOREACH (line IN source_segment_data.lines |
        CREATE (:Span {start: line.start, end: line.end})-[:SPAN_OF]->(segment))
    WITH count(*) AS _
    UNWIND $alignments AS alignment_data
    MATCH (source_segment:Segment {id: alignment_data.source_id}),
          (target_segment:Segment {id: alignment_data.target_id})
    CREATE (source_segment)-[:ALIGNED_TO]->(target_segment)
    RETURN count(*) AS count
    ";

    /// Lookup by source-side layer id, or every alignment attached to a
    /// manifestation. One row per (source layer, target manifestation);
    /// source segments arrive ordered by their minimal span start with the
    /// targets they align to nested inside.
    pub const FETCH: &str = "
    MATCH (source_segmentation:Segmentation)
    WHERE ($segmentation_id IS NOT NULL AND source_segmentation.id = $segmentation_id)
       OR ($manifestation_id IS NOT NULL
           AND (source_segmentation)-[:SEGMENTATION_OF]->(:Manifestation {id: $manifestation_id}))
    MATCH (source_segmentation)<-[:SEGMENT_OF]-(source_segment:Segment)-[:ALIGNED_TO]->(target_segment:Segment)
          -[:SEGMENT_OF]->(:Segmentation)-[:SEGMENTATION_OF]->(target_manifestation:Manifestation)
    MATCH (target_manifestation)-[:MANIFESTATION_OF]->(target_expression:Expression)
    MATCH (source_span:Span)-[:SPAN_OF]->(source_segment)
    WITH source_segmentation, source_segment, target_segment, target_manifestation, target_expression,
         source_span ORDER BY source_span.start
    WITH source_segmentation, source_segment, target_segment, target_manifestation, target_expression,
         min(source_span.start) AS source_min_start,
         collect({start: source_span.start, end: source_span.end}) AS source_lines
    MATCH (target_span:Span)-[:SPAN_OF]->(target_segment)
    WITH source_segmentation, source_segment, source_min_start, source_lines,
         target_manifestation, target_expression, target_segment,
         target_span ORDER BY target_span.start
    WITH source_segmentation, source_segment, source_min_start, source_lines,
         target_manifestation, target_expression, target_segment,
         min(target_span.start) AS target_min_start,
         collect({start: target_span.start, end: target_span.end}) AS target_lines
    WITH source_segmentation, source_segment, source_min_start, source_lines,
         target_manifestation, target_expression,
         collect({id: target_segment.id, min_start: target_min_start, lines: target_lines}) AS aligned_targets
    ORDER BY source_min_start
    WITH source_segmentation, target_manifestation, target_expression,
         collect({min_start: source_min_start, lines: source_lines, aligned_targets: aligned_targets}) AS segments
    RETURN source_segmentation.id AS segmentation_id,
           target_manifestation.id AS target_manifestation_id,
           target_expression.id AS target_expression_id,
           segments
    ";

    /// Alignment layer pairs reachable from a manifestation.
    pub const PAIRS_BY_MANIFESTATION: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(own:Segmentation {kind: 'alignment'})
    MATCH (own)<-[:SEGMENT_OF]-(:Segment)-[:ALIGNED_TO]-(:Segment)-[:SEGMENT_OF]->(peer:Segmentation)
    RETURN DISTINCT own.id AS source_id, peer.id AS peer_id
    ";

    /// Peer-side segments reached from segments of `$segmentation_id`
    /// overlapping `[$span_start, $span_end)`, with all their spans,
    /// ordered by minimal start.
    pub const PEER_SEGMENTS_OVERLAPPING: &str = "
    MATCH (layer:Segmentation {id: $segmentation_id})<-[:SEGMENT_OF]-(source_segment:Segment)
    WHERE EXISTS {
        MATCH (s:Span)-[:SPAN_OF]->(source_segment)
        WHERE s.start < $span_end AND s.end > $span_start
    }
    MATCH (source_segment)-[:ALIGNED_TO]-(peer_segment:Segment)
    WITH DISTINCT peer_segment
    MATCH (span:Span)-[:SPAN_OF]->(peer_segment)
    WITH peer_segment, span ORDER BY span.start
    WITH peer_segment, min(span.start) AS min_start,
         collect({start: span.start, end: span.end}) AS lines
    ORDER BY min_start
    RETURN peer_segment.id AS segment_id, lines
    ";
}

pub mod segments {
    pub const FETCH_BY_ID: &str = "
    MATCH (segment:Segment {id: $segment_id})-[:SEGMENT_OF]->(:Segmentation)
        -[:SEGMENTATION_OF]->(manifestation:Manifestation)
        -[:MANIFESTATION_OF]->(expression:Expression)
    MATCH (span:Span)-[:SPAN_OF]->(segment)
    WITH segment, manifestation, expression, span ORDER BY span.start
    WITH segment, manifestation, expression,
         collect({start: span.start, end: span.end}) AS lines
    RETURN segment.id AS segment_id, manifestation.id AS manifestation_id,
           expression.id AS expression_id, lines
    ";

    /// Segments of the plain segmentation layer overlapping a byte range.
    pub const OVERLAPPING_SEGMENTATION_SEGMENTS: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(layer:Segmentation {kind: 'segmentation'})
    MATCH (layer)<-[:SEGMENT_OF]-(segment:Segment)
    WHERE EXISTS {
        MATCH (s:Span)-[:SPAN_OF]->(segment)
        WHERE s.start < $span_end AND s.end > $span_start
    }
    MATCH (span:Span)-[:SPAN_OF]->(segment)
    WITH segment, span ORDER BY span.start
    WITH segment, min(span.start) AS min_start,
         collect({start: span.start, end: span.end}) AS lines
    ORDER BY min_start
    RETURN segment.id AS segment_id, lines
    ";
}

pub mod notes {
    pub const CREATE: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
    MATCH (note_type:NoteType {name: $note_type})
    UNWIND $notes AS note_data
    CREATE (note:Note {id: note_data.id, text: note_data.text})-[:NOTE_OF]->(m)
    CREATE (note)-[:HAS_TYPE]->(note_type)
    CREATE (:Span {start: note_data.start, end: note_data.end})-[:SPAN_OF]->(note)
    RETURN collect(note.id) AS note_ids
    ";

    pub const FETCH_BY_ID: &str = "
    MATCH (note:Note {id: $note_id})-[:NOTE_OF]->(m:Manifestation)
    MATCH (note)-[:HAS_TYPE]->(note_type:NoteType)
    MATCH (span:Span)-[:SPAN_OF]->(note)
    RETURN note.id AS id, note.text AS note, note_type.name AS kind,
           span.start AS span_start, span.end AS span_end,
           m.id AS manifestation_id
    ";

    pub const DELETE: &str = "
    MATCH (note:Note {id: $note_id})
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(note)
    DETACH DELETE span, note
    ";
}

pub mod bibliography {
    pub const CREATE: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
    UNWIND $entries AS entry
    MATCH (bib_type:BibliographyType {name: entry.kind})
    CREATE (bib:BibliographicMetadata {id: entry.id})-[:BIBLIOGRAPHY_OF]->(m)
    CREATE (bib)-[:HAS_TYPE]->(bib_type)
    CREATE (:Span {start: entry.start, end: entry.end})-[:SPAN_OF]->(bib)
    RETURN collect(bib.id) AS metadata_ids
    ";

    pub const FETCH_BY_ID: &str = "
    MATCH (bib:BibliographicMetadata {id: $metadata_id})-[:BIBLIOGRAPHY_OF]->(m:Manifestation)
    MATCH (bib)-[:HAS_TYPE]->(bib_type:BibliographyType)
    MATCH (span:Span)-[:SPAN_OF]->(bib)
    RETURN bib.id AS id, bib_type.name AS kind,
           span.start AS span_start, span.end AS span_end,
           m.id AS manifestation_id
    ";

    pub const DELETE: &str = "
    MATCH (bib:BibliographicMetadata {id: $metadata_id})
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(bib)
    DETACH DELETE span, bib
    ";
}

pub mod spans {
    /// Every span anchored to the manifestation (through a Note,
    /// BibliographicMetadata, or Segment) that ends after the replacement
    /// start, except spans of the excluded entity.
    pub const FIND_AFFECTED: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})<-[:NOTE_OF|BIBLIOGRAPHY_OF]-(entity)
        <-[:SPAN_OF]-(span:Span)
    WHERE span.end > $replace_start AND entity.id <> $exclude_entity_id
    RETURN entity.id AS entity_id, span.start AS span_start, span.end AS span_end
    UNION
    MATCH (m:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(:Segmentation)
        <-[:SEGMENT_OF]-(entity:Segment)<-[:SPAN_OF]-(span:Span)
    WHERE span.end > $replace_start AND entity.id <> $exclude_entity_id
    RETURN entity.id AS entity_id, span.start AS span_start, span.end AS span_end
    ";

    pub const UPDATE: &str = "
    MATCH (span:Span)-[:SPAN_OF]->(entity {id: $entity_id})
    SET span.start = $new_start, span.end = $new_end
    ";

    /// Rewrites only the end, keeping the start (the entity whose text was
    /// just replaced).
    pub const UPDATE_END: &str = "
    MATCH (span:Span)-[:SPAN_OF]->(entity {id: $entity_id})
    SET span.end = span.start + $new_length
    ";

    /// Cascade delete of the owning entity together with its spans.
    pub const DELETE_OWNER: &str = "
    MATCH (entity {id: $entity_id})
    OPTIONAL MATCH (span:Span)-[:SPAN_OF]->(entity)
    DETACH DELETE span, entity
    ";
}

pub mod persons {
    use super::fragments;

    fn projection() -> String {
        format!(
            "{{
        id: person.id,
        bdrc: person.bdrc,
        wiki: person.wiki,
        name: [{name}],
        alt_names: [{alt_names}]
    }} AS person",
            name = fragments::primary_nomen("person", "HAS_NAME"),
            alt_names = fragments::alternative_nomen("person", "HAS_NAME"),
        )
    }

    pub fn fetch_by_id() -> String {
        format!("MATCH (person:Person {{id: $id}})\n    RETURN {}", projection())
    }

    pub fn fetch_all() -> String {
        format!(
            "MATCH (person:Person)
    WITH person ORDER BY person.id
    SKIP $offset LIMIT $limit
    RETURN {}",
            projection()
        )
    }

    pub const CREATE: &str = "
    MATCH (nomen:Nomen {id: $primary_nomen_id})
    CREATE (person:Person {id: $id, bdrc: $bdrc, wiki: $wiki})
    CREATE (person)-[:HAS_NAME]->(nomen)
    RETURN person.id AS person_id
    ";

    pub const HAS_CONTRIBUTIONS: &str = "
    MATCH (person:Person {id: $id})
    RETURN EXISTS { (person)<-[:CONTRIBUTED_BY]-(:Expression) } AS has_contributions
    ";

    /// Removes the person and their name subgraph.
    pub const DELETE: &str = "
    MATCH (person:Person {id: $id})
    OPTIONAL MATCH (person)-[:HAS_NAME]->(nomen:Nomen)
    OPTIONAL MATCH (alt:Nomen)-[:ALTERNATIVE_OF]->(nomen)
    OPTIONAL MATCH (nomen)-[:HAS_LOCALIZATION]->(text:LocalizedText)
    OPTIONAL MATCH (alt)-[:HAS_LOCALIZATION]->(alt_text:LocalizedText)
    DETACH DELETE text, alt_text, alt, nomen, person
    ";
}

pub mod categories {
    pub const FETCH_SIBLINGS: &str = "
    MATCH (c:Category)-[:BELONGS_TO]->(:Application {id: $application})
    WHERE ($parent_id IS NULL AND NOT (c)-[:HAS_PARENT]->(:Category))
       OR ($parent_id IS NOT NULL AND (c)-[:HAS_PARENT]->(:Category {id: $parent_id}))
    OPTIONAL MATCH (c)-[:HAS_PARENT]->(parent:Category)
    OPTIONAL MATCH (c)-[:HAS_TITLE]->(:Nomen)-[:HAS_LOCALIZATION]->(lt:LocalizedText)
        -[:HAS_LANGUAGE]->(:Language {code: $language})
    OPTIONAL MATCH (child:Category)-[:HAS_PARENT]->(c)
    WITH c, parent, lt, COUNT(DISTINCT child) > 0 AS has_child
    RETURN c.id AS id, parent.id AS parent, lt.text AS title, has_child
    ";

    pub const CREATE: &str = "
    MERGE (application:Application {id: $application})
    CREATE (c:Category {id: $category_id})-[:BELONGS_TO]->(application)
    CREATE (nomen:Nomen {id: $nomen_id})
    CREATE (c)-[:HAS_TITLE]->(nomen)
    FOREACH (lt IN $localized_texts |
        MERGE (language:Language {code: lt.base_lang_code})
        CREATE (nomen)-[:HAS_LOCALIZATION]->(:LocalizedText {text: lt.text})
            -[:HAS_LANGUAGE {bcp47: lt.bcp47_tag}]->(language))
    WITH c
    OPTIONAL MATCH (parent:Category {id: $parent_id})
    FOREACH (_ IN CASE WHEN parent IS NOT NULL THEN [1] ELSE [] END |
        CREATE (c)-[:HAS_PARENT]->(parent))
    RETURN c.id AS category_id
    ";

    /// Case-insensitive sibling title lookup used by the uniqueness check.
    pub const FIND_EXISTING: &str = "
    MATCH (c:Category)-[:BELONGS_TO]->(:Application {id: $application})
    WHERE ($parent_id IS NULL AND NOT (c)-[:HAS_PARENT]->(:Category))
       OR ($parent_id IS NOT NULL AND (c)-[:HAS_PARENT]->(:Category {id: $parent_id}))
    MATCH (c)-[:HAS_TITLE]->(:Nomen)-[:HAS_LOCALIZATION]->(lt:LocalizedText)
        -[:HAS_LANGUAGE]->(language:Language)
    WHERE language.code = $language AND toLower(lt.text) = toLower($title_text)
    RETURN c.id AS category_id
    LIMIT 1
    ";
}

pub mod api_keys {
    pub const CREATE: &str = "
    CREATE (key:ApiKey {
        id: $key_id,
        name: $name,
        email: $email,
        api_key_hash: $api_key_hash,
        is_active: true,
        created_at: datetime($created_at)
    })
    RETURN key.id AS id
    ";

    pub const CREATE_WITH_BINDING: &str = "
    MERGE (application:Application {id: $application_id})
    CREATE (key:ApiKey {
        id: $key_id,
        name: $name,
        email: $email,
        api_key_hash: $api_key_hash,
        is_active: true,
        created_at: datetime($created_at)
    })-[:BOUND_TO]->(application)
    RETURN key.id AS id
    ";

    pub const VALIDATE: &str = "
    MATCH (key:ApiKey {api_key_hash: $api_key_hash, is_active: true})
    OPTIONAL MATCH (key)-[:BOUND_TO]->(application:Application)
    RETURN key.id AS id, application.id AS bound_application_id
    ";

    pub const REVOKE: &str = "
    MATCH (key:ApiKey {id: $key_id})
    SET key.is_active = false
    RETURN key.id AS id
    ";

    pub const ROTATE: &str = "
    MATCH (key:ApiKey {id: $key_id})
    SET key.api_key_hash = $api_key_hash, key.is_active = true
    RETURN key.id AS id
    ";

    /// Never projects hashes.
    pub const LIST: &str = "
    MATCH (key:ApiKey)
    OPTIONAL MATCH (key)-[:BOUND_TO]->(application:Application)
    RETURN key.id AS id, key.name AS name, key.email AS email,
           key.is_active AS is_active, toString(key.created_at) AS created_at,
           application.id AS bound_application_id
    ORDER BY created_at DESC
    ";
}

pub mod validation {
    pub const LANGUAGE_CODES_EXIST: &str = "
    MATCH (language:Language)
    WITH collect(language.code) AS codes
    UNWIND $codes_to_check AS code
    WITH codes, code, code IN codes AS exists
    RETURN collect(CASE WHEN exists THEN NULL ELSE code END) AS missing, codes
    ";

    pub const CATEGORY_EXISTS: &str = "
    MATCH (category:Category {id: $category_id})
    RETURN count(category) AS count
    ";

    pub const EXPRESSION_EXISTS: &str = "
    MATCH (expression:Expression {id: $expression_id})
    RETURN count(expression) AS count
    ";

    pub const PERSONS_EXIST: &str = "
    UNWIND $person_ids AS person_id
    OPTIONAL MATCH (person:Person {id: person_id})
    RETURN person_id, person IS NOT NULL AS exists
    ";

    pub const PERSONS_EXIST_BY_BDRC: &str = "
    UNWIND $person_bdrc_ids AS bdrc_id
    OPTIONAL MATCH (person:Person {bdrc: bdrc_id})
    RETURN bdrc_id, person IS NOT NULL AS exists
    ";

    pub const ORIGINAL_EXPRESSION_COUNT: &str = "
    MATCH (work:Work {id: $work_id})<-[:EXPRESSION_OF {original: true}]-(expression:Expression)
    RETURN count(expression) AS existing_count
    ";

    pub const CRITICAL_MANIFESTATION_COUNT: &str = "
    MATCH (expression:Expression {id: $expression_id})
        <-[:MANIFESTATION_OF]-(manifestation:Manifestation {type: 'critical'})
    RETURN count(manifestation) AS existing_count
    ";

    pub const ANNOTATION_KIND_COUNT: &str = "
    MATCH (m:Manifestation {id: $manifestation_id})
        <-[:SEGMENTATION_OF]-(layer:Segmentation {kind: $kind})
    RETURN count(layer) AS count
    ";

    pub const ALIGNMENT_BETWEEN_COUNT: &str = "
    MATCH (m1:Manifestation {id: $manifestation_id})<-[:SEGMENTATION_OF]-(a1:Segmentation {kind: 'alignment'})
    MATCH (a1)<-[:SEGMENT_OF]-(:Segment)-[:ALIGNED_TO]-(:Segment)-[:SEGMENT_OF]->(a2:Segmentation)
    MATCH (a2)-[:SEGMENTATION_OF]->(m2:Manifestation {id: $target_manifestation_id})
    RETURN count(*) AS count
    ";

    pub const EXPRESSION_TITLE_EXISTS: &str = "
    UNWIND $titles AS item
    RETURN EXISTS {
        MATCH (e:Expression)-[:HAS_TITLE]->(:Nomen)-[:HAS_LOCALIZATION]->(lt:LocalizedText)
              -[:HAS_LANGUAGE]->(language:Language {code: item.lang})
        WHERE toLower(lt.text) = toLower(item.text)
    } AS exists
    ";

    pub const BIBLIOGRAPHY_TYPES_EXIST: &str = "
    MATCH (bib_type:BibliographyType)
    WITH collect(bib_type.name) AS names
    UNWIND $names_to_check AS name
    WITH names, name, name IN names AS exists
    RETURN collect(CASE WHEN exists THEN NULL ELSE name END) AS missing
    ";

    pub const NOTE_TYPE_EXISTS: &str = "
    MATCH (note_type:NoteType {name: $name})
    RETURN count(note_type) AS count
    ";
}
