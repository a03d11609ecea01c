use std::path::PathBuf;
use vocab_ladder::{DirSource, LanguageDirection, Level, WordSource};

fn shipped() -> DirSource {
    DirSource::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("words"))
}

#[tokio::test]
async fn test_every_shipped_list_loads() {
    let source = shipped();
    for direction in [LanguageDirection::EnRu, LanguageDirection::RuEn] {
        for level in Level::ALL {
            let words = source
                .fetch(direction, level)
                .await
                .unwrap_or_else(|e| panic!("{:?} {}: {}", direction, level, e));
            assert!(!words.is_empty());
            for word in &words {
                assert_eq!(word.options.len(), 4, "{}", word.text);
                assert_eq!(
                    word.options.iter().filter(|o| o.correct).count(),
                    1,
                    "{}",
                    word.text
                );
            }
        }
    }
}
