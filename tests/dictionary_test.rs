use std::collections::BTreeSet;

use lexiclass::prelude::*;
use tempfile::tempdir;

fn corpus_a() -> Vec<Instance> {
    vec![
        Instance::text("buy cheap pills online", "spam"),
        Instance::text("project meeting at noon", "ham"),
        Instance::text("cheap flights and cheap hotels", "spam"),
    ]
}

fn corpus_b() -> Vec<Instance> {
    vec![
        Instance::text("meeting notes attached", "ham"),
        Instance::text("win a free cruise", "spam"),
        Instance::text("lunch after the project review", "ham"),
        Instance::text("new newsletter issue", "news"),
    ]
}

fn classifier() -> TextClassifier {
    TextClassifier::new(FeatureSetting::words(1, 2).build().unwrap()).with_scorer(
        BayesScorer::new(BayesOptions::new().laplace(1.0).priors(true)).unwrap(),
    )
}

fn all_terms(models: &[&dyn DictionaryModel]) -> BTreeSet<String> {
    models
        .iter()
        .flat_map(|model| model.entries().map(|e| e.unwrap().term))
        .collect()
}

#[test]
fn test_merge_equivalence() {
    let classifier = classifier();
    let a = classifier.train(corpus_a()).unwrap();
    let b = classifier.train(corpus_b()).unwrap();

    let mut union = corpus_a();
    union.extend(corpus_b());
    let direct = classifier.train(union).unwrap();

    let merged = a.merge(&b).unwrap();

    let mut builder = classifier.train_builder();
    builder.add_dictionary(&a).unwrap().add_dictionary(&b).unwrap();
    let built = builder.create();

    for term in all_terms(&[&a, &b]) {
        let expected = direct.category_entries(&term).unwrap();
        assert_eq!(merged.category_entries(&term).unwrap(), expected, "{term}");
        assert_eq!(built.category_entries(&term).unwrap(), expected, "{term}");
    }
    assert_eq!(merged.document_counts(), direct.document_counts());
    assert_eq!(merged.term_counts(), direct.term_counts());
    assert_eq!(merged.num_entries(), direct.num_entries());
    assert_eq!(merged.num_unique_terms(), direct.num_unique_terms());
    assert_eq!(merged, direct);
    assert_eq!(built, direct);
}

#[test]
fn test_merge_rejects_different_settings() {
    let words = classifier().train(corpus_a()).unwrap();
    let chars = TextClassifier::new(FeatureSetting::chars(3, 3).build().unwrap())
        .train(corpus_b())
        .unwrap();

    let err = words.merge(&chars).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_backend_round_trip() {
    let dir = tempdir().unwrap();
    let classifier = classifier();
    let mut union = corpus_a();
    union.extend(corpus_b());
    let memory = classifier.train(union).unwrap();
    let persisted = memory.index(dir.path().join("model")).unwrap();

    assert_eq!(persisted.num_unique_terms(), memory.num_unique_terms());
    assert_eq!(persisted.num_entries(), memory.num_entries());
    assert_eq!(persisted.feature_setting(), memory.feature_setting());

    let held_out = [
        "cheap pills",
        "project meeting",
        "free cruise online",
        "newsletter",
        "completely unseen words",
        "",
    ];
    for text in held_out {
        let a = classifier.classify_text(text, &memory).unwrap();
        let b = classifier.classify_text(text, &persisted).unwrap();
        assert_eq!(
            a.most_likely().map(|e| e.name().to_string()),
            b.most_likely().map(|e| e.name().to_string()),
            "{text}"
        );
        for entry in &a {
            assert!((entry.score() - b.score(entry.name())).abs() < 1e-6, "{text}");
        }
    }
}

#[test]
fn test_train_persisted() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("trained");
    let persisted = classifier().train_persisted(corpus_a(), &target).unwrap();

    assert_eq!(persisted.category_entries("cheap").unwrap().count("spam"), 2);
    assert_eq!(persisted.directory(), target.as_path());
}

#[test]
fn test_index_refuses_existing_path() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("model");
    let model = classifier().train(corpus_a()).unwrap();
    model.index(&target).unwrap();

    let err = model.index(&target).unwrap_err();
    assert!(err.to_string().contains("already exists"), "{err}");

    // The first index is untouched.
    let reopened = PersistedDictionary::open(&target).unwrap();
    assert_eq!(reopened.num_unique_terms(), model.num_unique_terms());
}

#[test]
fn test_double_open_and_reopen() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("model");
    let model = classifier().train(corpus_a()).unwrap();
    drop(model.index(&target).unwrap());

    let mut first = PersistedDictionary::open(&target).unwrap();
    let second = PersistedDictionary::open(&target).unwrap();
    for entry in model.entries() {
        let entry = entry.unwrap();
        assert_eq!(first.category_entries(&entry.term).unwrap(), entry.category_entries);
        assert_eq!(second.category_entries(&entry.term).unwrap(), entry.category_entries);
    }

    first.close().unwrap();
    first.close().unwrap();
    assert!(first.category_entries("cheap").is_err());
    assert_eq!(second.category_entries("cheap").unwrap().count("spam"), 2);
    drop(second);

    let third = PersistedDictionary::open(&target).unwrap();
    assert_eq!(third.category_entries("cheap").unwrap().count("spam"), 2);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let model = classifier().train(corpus_b()).unwrap();
    model.save(dir.path(), "model.lxd").unwrap();

    let loaded = InMemoryDictionary::load(dir.path(), "model.lxd").unwrap();
    assert_eq!(loaded.categories(), vec!["ham", "news", "spam"]);
    let a: Vec<_> = loaded.entries().map(|e| e.unwrap()).collect();
    let b: Vec<_> = model.entries().map(|e| e.unwrap()).collect();
    assert_eq!(a, b);
    assert_eq!(loaded, model);
}

#[test]
fn test_csv_dump() {
    let dir = tempdir().unwrap();
    let model = TextClassifier::new(FeatureSetting::words(1, 1).build().unwrap())
        .train(vec![
            Instance::text("cheap pills", "spam"),
            Instance::text("cheap room", "ham"),
        ])
        .unwrap();
    let persisted = model.index(dir.path().join("csv")).unwrap();

    let mut memory_csv = Vec::new();
    model.write_csv(&mut memory_csv).unwrap();
    let mut persisted_csv = Vec::new();
    persisted.write_csv(&mut persisted_csv).unwrap();

    let csv = String::from_utf8(memory_csv).unwrap();
    assert_eq!(csv, "term,ham,spam\ncheap,0.5,0.5\npills,0,1\nroom,1,0\n");
    assert_eq!(String::from_utf8(persisted_csv).unwrap(), csv);
}

#[test]
fn test_pruning_survives_indexing() {
    let dir = tempdir().unwrap();
    let model = classifier()
        .with_pruning(PruningStrategy::MinTermCount(2))
        .train(corpus_a())
        .unwrap();
    let persisted = model.index(dir.path().join("pruned")).unwrap();

    assert_eq!(model.num_unique_terms(), 1);
    assert_eq!(persisted.num_unique_terms(), 1);
    assert_eq!(persisted.category_entries("cheap").unwrap().count("spam"), 2);
    assert_eq!(persisted.document_counts().count("spam"), 2);
}
