//! Pagination layers: a segmentation whose segments each carry a page
//! label (`Reference` node). At most one pagination per manifestation.

use neo4rs::{Txn, query};
use services::generate_id;
use tracing::info;

use crate::annotation::segmentation::{SegmentationLayer, validate_lines};
use crate::client::{GraphClient, txn_required};
use crate::errors::{GraphError, Result};
use crate::model::{AnnotationKind, PageInput, SegmentationRecord};
use crate::queries::{paginations, params};
use crate::validate;

#[derive(Clone)]
pub struct PaginationLayer {
    client: GraphClient,
}

impl PaginationLayer {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, segmentation_id: &str) -> Result<SegmentationRecord> {
        SegmentationLayer::new(self.client.clone()).get(segmentation_id).await
    }

    pub async fn add(&self, manifestation_id: &str, pages: &[PageInput]) -> Result<String> {
        self.client
            .execute_write(async |tx| Self::add_in_txn(tx, manifestation_id, pages).await)
            .await
    }

    pub async fn update(&self, segmentation_id: &str, pages: &[PageInput]) -> Result<String> {
        self.client
            .execute_write(async |tx| {
                let context = SegmentationLayer::require_context(tx, segmentation_id).await?;
                if context.kind != AnnotationKind::Pagination {
                    return Err(GraphError::invalid(format!(
                        "segmentation '{segmentation_id}' is not a pagination"
                    )));
                }
                SegmentationLayer::delete_in_txn(tx, segmentation_id).await?;
                Self::add_in_txn(tx, &context.manifestation_id, pages).await
            })
            .await
    }

    pub async fn delete(&self, segmentation_id: &str) -> Result<()> {
        SegmentationLayer::new(self.client.clone()).delete(segmentation_id).await
    }

    /// Creates the pagination layer together with one `Reference` per
    /// segment; enforces the one-pagination-per-manifestation invariant.
    pub async fn add_in_txn(tx: &mut Txn, manifestation_id: &str, pages: &[PageInput]) -> Result<String> {
        if pages.is_empty() {
            return Err(GraphError::invalid("pagination cannot be empty"));
        }
        validate_lines(pages.iter().flat_map(|page| page.lines.iter()))?;
        validate::no_annotation_of_kind(tx, manifestation_id, AnnotationKind::Pagination).await?;

        let segmentation_id = generate_id();
        let payload = params::list(pages.iter().map(|page| {
            params::map([
                ("id", generate_id().into()),
                ("reference_id", generate_id().into()),
                ("reference", page.reference.as_str().into()),
                ("lines", params::lines(&page.lines)),
            ])
        }));
        let q = query(paginations::CREATE)
            .param("manifestation_id", manifestation_id)
            .param("segmentation_id", segmentation_id.as_str())
            .param("segments", payload);
        txn_required(tx, q, format!("manifestation '{manifestation_id}' not found")).await?;

        info!(%segmentation_id, pages = pages.len(), "pagination created");
        Ok(segmentation_id)
    }
}
