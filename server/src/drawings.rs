use uuid::Uuid;

pub fn new_drawing_id() -> String {
    Uuid::new_v4().to_string()
}

/// Ids arrive as path segments; anything that is not a UUID never reaches
/// storage, so malformed ids cannot name arbitrary files or objects.
pub fn normalize_drawing_id(value: &str) -> Option<String> {
    let parsed = Uuid::parse_str(value).ok()?;
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_normalize_to_themselves() {
        let id = new_drawing_id();
        assert_eq!(normalize_drawing_id(&id).as_deref(), Some(id.as_str()));
    }

    #[test]
    fn normalize_canonicalizes_case() {
        let id = "67E55044-10B1-426F-9247-BB680E5FE0C8";
        assert_eq!(
            normalize_drawing_id(id).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
    }

    #[test]
    fn normalize_rejects_path_like_ids() {
        assert!(normalize_drawing_id("../etc/passwd").is_none());
        assert!(normalize_drawing_id("42").is_none());
        assert!(normalize_drawing_id("").is_none());
    }
}
