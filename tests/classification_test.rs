use lexiclass::prelude::*;

fn spam_ham() -> Vec<Instance> {
    vec![
        Instance::text("buy cheap pills", "spam"),
        Instance::text("meeting agenda attached", "ham"),
        Instance::text("cheap meeting room", "ham"),
    ]
}

fn words_classifier() -> TextClassifier {
    TextClassifier::new(FeatureSetting::words(1, 1).max_terms(10).build().unwrap())
}

fn bayes(options: BayesOptions) -> Scorer {
    BayesScorer::new(options).unwrap().into()
}

#[test]
fn test_spam_ham_dictionary() {
    let model = words_classifier().train(spam_ham()).unwrap();

    let cheap = model.category_entries("cheap").unwrap();
    assert_eq!(cheap.count("spam"), 1);
    assert_eq!(cheap.count("ham"), 1);
    assert_eq!(cheap.len(), 2);

    let meeting = model.category_entries("meeting").unwrap();
    assert_eq!(meeting.count("ham"), 2);
    assert!(!meeting.contains("spam"));

    for term in ["buy", "pills"] {
        let entries = model.category_entries(term).unwrap();
        assert_eq!(entries.count("spam"), 1);
        assert_eq!(entries.len(), 1);
    }
    for term in ["agenda", "attached", "room"] {
        let entries = model.category_entries(term).unwrap();
        assert_eq!(entries.count("ham"), 1);
        assert_eq!(entries.len(), 1);
    }

    assert_eq!(model.num_unique_terms(), 7);
    assert_eq!(model.document_counts().count("ham"), 2);
    assert_eq!(model.document_counts().count("spam"), 1);
}

#[test]
fn test_spam_ham_ranking() {
    let classifier = words_classifier();
    let model = classifier.train(spam_ham()).unwrap();

    let spam = classifier.classify_text("buy pills", &model).unwrap();
    assert!(spam.score("spam") > spam.score("ham"));
    assert_eq!(spam.most_likely().unwrap().name(), "spam");

    let ham = classifier.classify_text("meeting room", &model).unwrap();
    assert!(ham.score("ham") > ham.score("spam"));
}

#[test]
fn test_probabilities_are_normalized() {
    let model = words_classifier().train(spam_ham()).unwrap();
    let scorers = [
        Scorer::default(),
        bayes(BayesOptions::new()),
        bayes(BayesOptions::new().laplace(1.0)),
        bayes(BayesOptions::new().laplace(1.0).priors(true)),
        bayes(BayesOptions::new().laplace(1.0).priors(true).complement(true)),
        bayes(BayesOptions::new().laplace(0.1).frequencies(true)),
    ];

    for scorer in scorers {
        let classifier = words_classifier().with_scorer(scorer.clone());
        for text in ["buy pills", "meeting room", "cheap cheap agenda", "pills and a room"] {
            let result = classifier.classify_text(text, &model).unwrap();
            let total: f64 = result.iter().map(|e| e.score()).sum();
            assert!((total - 1.0).abs() < 1e-6, "{scorer:?} on {text:?}: {result}");
        }
    }
}

#[test]
fn test_laplace_non_degeneracy() {
    let model = words_classifier().train(spam_ham()).unwrap();
    let options = [
        BayesOptions::new().laplace(1.0),
        BayesOptions::new().laplace(1.0).priors(true),
        BayesOptions::new().laplace(0.5).complement(true),
        BayesOptions::new().laplace(1.0).priors(true).complement(true),
    ];

    for options in options {
        let classifier = words_classifier().with_scorer(bayes(options));
        for text in ["buy pills", "meeting agenda attached", "cheap"] {
            let result = classifier.classify_text(text, &model).unwrap();
            for category in ["spam", "ham"] {
                let p = result.probability(category);
                assert!(p > 0.0 && p < 1.0, "{options:?} {text:?}: {category}={p}");
            }
        }
    }
}

#[test]
fn test_complement_ranks_like_plain_bayes() {
    let instances = vec![
        Instance::text("win money now", "spam"),
        Instance::text("cheap money offer", "spam"),
        Instance::text("project meeting notes", "ham"),
        Instance::text("lunch meeting tomorrow", "ham"),
        Instance::text("project budget review", "ham"),
        Instance::text("notes from the review", "ham"),
    ];
    let model = words_classifier().train(instances).unwrap();

    let plain = words_classifier().with_scorer(bayes(BayesOptions::new().laplace(1.0)));
    let complement =
        words_classifier().with_scorer(bayes(BayesOptions::new().laplace(1.0).complement(true)));

    for (text, expected) in [("money offer", "spam"), ("meeting notes", "ham")] {
        for classifier in [&plain, &complement] {
            let result = classifier.classify_text(text, &model).unwrap();
            assert_eq!(result.most_likely().unwrap().name(), expected, "{text}");
        }
    }
}

#[test]
fn test_novel_vocabulary_returns_priors() {
    let classifier = words_classifier();
    let model = classifier.train(spam_ham()).unwrap();

    for text in ["", "   ", "quantum chromodynamics"] {
        let result = classifier.classify_text(text, &model).unwrap();
        assert!((result.probability("ham") - 2.0 / 3.0).abs() < 1e-12);
        assert!((result.probability("spam") - 1.0 / 3.0).abs() < 1e-12);
    }

    let empty = DictionaryBuilder::new().create();
    assert!(classifier.classify_text("buy pills", &empty).unwrap().is_empty());
}

#[test]
fn test_classify_terms_input() {
    let classifier = words_classifier();
    let model = classifier.train(spam_ham()).unwrap();

    let input = Input::Terms(vec!["buy".to_string(), "pills".to_string()]);
    let from_terms = classifier.classify(&input, &model).unwrap();
    let from_text = classifier.classify_text("Buy PILLS", &model).unwrap();
    assert_eq!(from_terms, from_text);
}

#[test]
fn test_reject_all_pruning_keeps_counts() {
    let full = words_classifier().train(spam_ham()).unwrap();
    let pruned = words_classifier()
        .with_pruning(PruningStrategy::RejectAll)
        .train(spam_ham())
        .unwrap();

    assert_eq!(pruned.num_entries(), 0);
    assert_eq!(pruned.num_unique_terms(), 0);
    assert_eq!(pruned.document_counts(), full.document_counts());
    assert_eq!(pruned.term_counts(), full.term_counts());
}

#[test]
fn test_character_ngrams() {
    let classifier = TextClassifier::new(FeatureSetting::chars(3, 4).build().unwrap());
    let model = classifier
        .train(vec![
            Instance::text("Lieber Kunde, vielen Dank", "de"),
            Instance::text("Guten Morgen und danke", "de"),
            Instance::text("Dear customer, thank you", "en"),
            Instance::text("Good morning and thanks", "en"),
        ])
        .unwrap();

    let de = classifier.classify_text("vielen dank", &model).unwrap();
    assert_eq!(de.most_likely().unwrap().name(), "de");
    let en = classifier.classify_text("thank you", &model).unwrap();
    assert_eq!(en.most_likely().unwrap().name(), "en");
}

#[test]
fn test_configured_classifier() {
    let config = ClassifierConfig::from_json_str(
        r#"{
            "feature_setting": {"feature_type": "word", "min_ngram_length": 1, "max_ngram_length": 1, "max_terms": 10},
            "scorer": {"type": "bayes", "laplace": 1.0, "priors": true}
        }"#,
    )
    .unwrap();
    let classifier = config.build().unwrap();
    let model = classifier.train(spam_ham()).unwrap();

    let result = classifier.classify_text("buy cheap pills", &model).unwrap();
    assert_eq!(result.most_likely().unwrap().name(), "spam");
}

#[test]
fn test_classification_is_repeatable_across_threads() {
    let classifier = words_classifier();
    let model = classifier.train(spam_ham()).unwrap();
    let expected = classifier.classify_text("cheap meeting", &model).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let result = classifier.classify_text("cheap meeting", &model).unwrap();
                    assert_eq!(result, expected);
                }
            });
        }
    });
}
