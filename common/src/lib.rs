//! Photo Ingest Common Library
//!
//! CLIとストア/カタログ実装で共有される型と純粋ロジック（I/Oなし）

pub mod error;
pub mod generation;
pub mod keywords;
pub mod location;
pub mod metadata;
pub mod naming;
pub mod prompts;
pub mod rules;
pub mod scorer;
pub mod types;

pub use error::{Error, Result};
pub use generation::{detect_generation, is_already_processed, NamingGeneration};
pub use keywords::{extract_keywords, normalize_caption};
pub use location::extract_postal_code;
pub use metadata::{clean_description, content_type_for, object_metadata};
pub use naming::{location_folder, object_key, resolve_unique, CanonicalName, MAX_NAME_ATTEMPTS};
pub use rules::{BonusRule, CategoryRule, RuleTable};
pub use scorer::categorize;
pub use types::{Classification, FallbackReason, LocationTag, MatchScore, ProcessingRecord};
