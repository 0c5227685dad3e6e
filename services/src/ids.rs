use rand::Rng;

const ID_LENGTH: usize = 21;
const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Mints an opaque 21-character identifier over a 62-character alphabet.
///
/// No server-side uniqueness check is performed; the space (62^21) makes
/// collisions negligible, and every entity label additionally carries a
/// uniqueness constraint on `id` in the graph.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_fixed_length() {
        assert_eq!(generate_id().len(), 21);
    }

    #[test]
    fn id_is_drawn_from_alphabet() {
        let id = generate_id();
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn ids_do_not_repeat_in_a_small_sample() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_id()));
        }
    }
}
