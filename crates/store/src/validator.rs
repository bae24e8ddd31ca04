//! Acceptance rules for candidate artifacts.

use crate::artifact::ArtifactMeta;
use crate::catalog::Catalog;
use crate::error::{Result, UploadError, ValidationError};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_TYPE_LEN: usize = 10;
pub const MAX_SIZE: u64 = 200_000_000;
pub const ACCEPTED_TYPES: [&str; 7] = ["jpeg", "jpg", "png", "gif", "bmp", "tiff", "pdf"];

pub fn is_accepted_type(file_type: &str) -> bool {
    ACCEPTED_TYPES.contains(&file_type)
}

/// The stateless rules, first violation wins.
pub fn check_rules(meta: &ArtifactMeta) -> std::result::Result<(), ValidationError> {
    let name_len = meta.name.chars().count();
    if name_len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len: name_len,
            max: MAX_NAME_LEN,
        });
    }

    let type_len = meta.file_type.chars().count();
    if type_len > MAX_TYPE_LEN {
        return Err(ValidationError::TypeTooLong {
            len: type_len,
            max: MAX_TYPE_LEN,
        });
    }

    if !is_accepted_type(&meta.file_type) {
        return Err(ValidationError::UnsupportedType(meta.file_type.clone()));
    }

    if meta.size > MAX_SIZE {
        return Err(ValidationError::TooLarge {
            size: meta.size,
            max: MAX_SIZE,
        });
    }
    if meta.size == 0 {
        return Err(ValidationError::Empty);
    }

    Ok(())
}

/// Full check: the rules above, then name uniqueness against the catalog.
///
/// The lookup is advisory. Two concurrent creates can both pass it; the
/// catalog's unique constraint decides the loser.
pub async fn validate(meta: &ArtifactMeta, catalog: &dyn Catalog) -> Result<()> {
    check_rules(meta)?;

    if catalog.get_by_name(&meta.name).await?.is_some() {
        return Err(UploadError::Conflict(meta.name.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::database::{Database, TableName};

    fn meta(name: &str, size: u64, file_type: &str) -> ArtifactMeta {
        ArtifactMeta::new(name, size, file_type)
    }

    #[test]
    fn test_accepted_types() {
        for ty in ACCEPTED_TYPES {
            assert!(check_rules(&meta("photo", 10, ty)).is_ok(), "{ty} rejected");
        }
        for ty in ["exe", "txt", "PNG", "svg", "webp", ""] {
            assert_eq!(
                check_rules(&meta("photo", 10, ty)),
                Err(ValidationError::UnsupportedType(ty.to_string()))
            );
        }
    }

    #[test]
    fn test_size_boundary() {
        assert!(check_rules(&meta("big", MAX_SIZE, "pdf")).is_ok());
        assert_eq!(
            check_rules(&meta("big", MAX_SIZE + 1, "pdf")),
            Err(ValidationError::TooLarge {
                size: MAX_SIZE + 1,
                max: MAX_SIZE
            })
        );
        assert_eq!(check_rules(&meta("empty", 0, "pdf")), Err(ValidationError::Empty));
    }

    #[test]
    fn test_name_boundary_counts_chars() {
        let fifty = "é".repeat(50);
        assert!(check_rules(&meta(&fifty, 1, "png")).is_ok());

        let fifty_one = "a".repeat(51);
        assert_eq!(
            check_rules(&meta(&fifty_one, 1, "png")),
            Err(ValidationError::NameTooLong { len: 51, max: 50 })
        );
    }

    #[test]
    fn test_first_violated_rule_wins() {
        let long_name = "n".repeat(51);
        let long_type = "t".repeat(11);

        // every rule broken: name is reported
        assert!(matches!(
            check_rules(&meta(&long_name, MAX_SIZE + 1, &long_type)),
            Err(ValidationError::NameTooLong { .. })
        ));
        // type length beats the accepted set and size
        assert!(matches!(
            check_rules(&meta("ok", MAX_SIZE + 1, &long_type)),
            Err(ValidationError::TypeTooLong { len: 11, .. })
        ));
        // accepted set beats size
        assert!(matches!(
            check_rules(&meta("ok", MAX_SIZE + 1, "exe")),
            Err(ValidationError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn test_existing_name_is_a_conflict() {
        let db = Database::in_memory().await.unwrap();
        let catalog = SqliteCatalog::open(db, TableName::default()).await.unwrap();

        validate(&meta("report", 10, "pdf"), &catalog).await.unwrap();
        catalog.create(&meta("report", 10, "pdf")).await.unwrap();

        // different type, same name
        let err = validate(&meta("report", 10, "png"), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Conflict(name) if name == "report"));
    }

    #[tokio::test]
    async fn test_rules_run_before_lookup() {
        let db = Database::in_memory().await.unwrap();
        let catalog = SqliteCatalog::open(db, TableName::default()).await.unwrap();
        catalog.create(&meta("report", 10, "pdf")).await.unwrap();

        let err = validate(&meta("report", 10, "exe"), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::UnsupportedType(_))
        ));
    }
}
