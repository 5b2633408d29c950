//! Dialect for peers whose router rejects a trailing slash.

use super::NodeAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrailingSlashAdapter;

impl NodeAdapter for NoTrailingSlashAdapter {
    fn name(&self) -> &'static str {
        "no_trailing_slash"
    }

    fn trailing_slash(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::test_node;
    use uuid::Uuid;

    #[test]
    fn test_urls_have_no_trailing_slash() {
        let node = test_node("https://peer.example", "no_trailing_slash");

        assert_eq!(
            NoTrailingSlashAdapter.authors_url(&node),
            "https://peer.example/service/authors"
        );
        assert!(
            NoTrailingSlashAdapter
                .followers_url(&node, Uuid::nil())
                .ends_with("/followers")
        );
    }
}
