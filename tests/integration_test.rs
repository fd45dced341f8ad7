use insight_engine::analyzer::AnalyzerReply;
use insight_engine::memory::Confidence;
use insight_engine::{AnalysisSession, AnalyzerConfig, LlmClient};
use polars::prelude::*;

fn offline_session() -> AnalysisSession {
    let config = AnalyzerConfig::default();
    AnalysisSession::new(LlmClient::offline(&config), config)
}

fn people_df() -> DataFrame {
    df![
        "age" => [22.0, 35.0, 41.0, 29.0, 33.0],
        "income" => [1800.0, 3200.0, 4100.0, 2500.0, 2900.0],
        "city" => ["lisbon", "porto", "lisbon", "faro", "porto"]
    ]
    .unwrap()
}

#[tokio::test]
async fn full_question_pipeline_runs_offline() {
    let mut session = offline_session();
    session.analyzer_mut().load_dataset(people_df());

    // profile conclusion is already in place
    let conclusions = session.analyzer().memory().conclusions();
    assert_eq!(conclusions.len(), 1);
    assert_eq!(conclusions[0].confidence, Confidence::High);
    assert!(conclusions[0].text.contains("2 numeric columns"));
    assert!(conclusions[0].text.contains("1 categorical columns"));
    assert!(conclusions[0].text.contains("Small dataset"));

    let reply = session.ask("Show me the distribution of age").await;
    let AnalyzerReply::Answer { text, chart } = reply else {
        panic!("expected an answer");
    };
    assert!(!text.is_empty());
    assert!(chart.unwrap().starts_with("data:image/svg+xml;base64,"));

    let memory = session.analyzer().memory();
    assert_eq!(memory.history().len(), 1);
    assert_eq!(memory.interactions(), 1);
    // the canned offline answer carries insight keywords and a marker phrase
    assert!(memory.insights().iter().any(|i| i.keyword == "high"));
    assert_eq!(memory.conclusions().len(), 2);
    assert_eq!(memory.conclusions()[1].confidence, Confidence::Medium);
    assert_eq!(memory.conclusions()[1].basis, 1);

    let report = session.analyzer().summarize();
    assert!(report.contains("Based on 1 recorded analyses"));
}

#[tokio::test]
async fn chart_selection_follows_question_keywords() {
    let mut session = offline_session();
    session.analyzer_mut().load_dataset(people_df());

    let reply = session.ask("Is there a correlation between age and income?").await;
    assert!(reply.chart().is_some());

    // categorical-only dataset falls back to the bar chart on any question
    session
        .analyzer_mut()
        .load_dataset(df!["city" => ["a", "b", "a"]].unwrap());
    let reply = session.ask("irrelevant text").await;
    assert!(reply.chart().is_some());
}

#[tokio::test]
async fn loading_a_second_dataset_fully_clears_memory() {
    let mut session = offline_session();
    session.analyzer_mut().load_dataset(people_df());
    session.ask("Any outlier in income?").await;
    session.ask("What is the trend over time?").await;
    assert_eq!(session.analyzer().memory().interactions(), 2);

    session
        .analyzer_mut()
        .load_dataset(df!["score" => [0.1, 0.5, 0.9]].unwrap());

    let memory = session.analyzer().memory();
    assert!(memory.history().is_empty());
    assert!(memory.insights().is_empty());
    assert!(memory.patterns().is_empty());
    assert_eq!(memory.interactions(), 0);
    // only the fresh profile conclusion remains
    assert_eq!(memory.conclusions().len(), 1);
    assert!(!memory.conclusions()[0].text.contains("categorical"));
}

#[tokio::test]
async fn question_without_dataset_yields_guidance_not_failure() {
    let mut session = offline_session();
    let reply = session.ask("what now?").await;
    assert!(matches!(reply, AnalyzerReply::NoDataset { .. }));
    assert!(reply.chart().is_none());
    // the exchange is still logged
    assert_eq!(session.conversation().messages().len(), 2);
}

#[tokio::test]
async fn two_sessions_in_one_process_stay_isolated() {
    let mut a = offline_session();
    let mut b = offline_session();

    a.analyzer_mut().load_dataset(people_df());
    b.analyzer_mut()
        .load_dataset(df!["v" => [1.0, 2.0]].unwrap());

    a.ask("Show the distribution").await;
    a.ask("Any pattern?").await;
    b.ask("Any pattern?").await;

    assert_eq!(a.analyzer().memory().interactions(), 2);
    assert_eq!(b.analyzer().memory().interactions(), 1);
    assert_ne!(
        a.analyzer().memory().conclusions()[0].text,
        b.analyzer().memory().conclusions()[0].text
    );
}

#[test]
fn csv_roundtrip_through_ingest() {
    let path = std::env::temp_dir().join(format!("insight-it-{}.csv", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        "age,income,city\n22,1800,lisbon\n35,3200,porto\n41,4100,lisbon\n",
    )
    .unwrap();

    let df = insight_engine::ingest::read_csv(&path).unwrap();
    assert_eq!(df.shape(), (3, 3));

    let profile =
        insight_engine::profile::DatasetProfile::build(&df, &AnalyzerConfig::default()).unwrap();
    assert_eq!(profile.numeric_columns, vec!["age", "income"]);
    assert_eq!(profile.categorical_columns, vec!["city"]);

    std::fs::remove_file(&path).ok();
}
