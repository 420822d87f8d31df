// tests/ranking_scenarios.rs
use chrono::{DateTime, TimeZone, Utc};
use news_digest::config::{DigestConfig, FilterMode};
use news_digest::ingest::normalize_article;
use news_digest::ingest::types::{Article, RawArticle};
use news_digest::{Category, RankingEngine};

const CONFIG: &str = r#"
blocklist = ["celebrity", "divorce"]
trusted_sources = ["reuters"]

[digest]
max_items = 5
mode = "selective"

[priority]
prague = 5
climate = 3
energy = 1

[[categories]]
category = "politics"
keywords = ["government", "summit"]
template = "p #{rank}"

[[categories]]
category = "international"
keywords = ["summit", "prague"]
template = "i #{rank}"
"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn cfg(mode: FilterMode) -> DigestConfig {
    let mut c = DigestConfig::from_toml_str(CONFIG).expect("valid config");
    c.digest.mode = mode;
    c
}

fn art(seq: usize, title: &str, source: &str, published: Option<&str>) -> Article {
    normalize_article(
        &RawArticle {
            title: Some(title.into()),
            description: None,
            url: Some(format!("https://news.example/{seq}")),
            published_at: published.map(Into::into),
            source_name: Some(source.into()),
        },
        seq,
    )
    .expect("has title")
}

#[test]
fn prague_climate_outranks_energy_only() {
    let e = RankingEngine::new(&cfg(FilterMode::Selective));
    let out = e.rank(
        vec![
            art(0, "Energy prices climb again", "Local Wire", None),
            art(1, "Prague hosts climate summit", "Local Wire", None),
        ],
        now(),
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].article.title, "Prague hosts climate summit");
    assert_eq!(out[0].score, 8);
    assert_eq!(out[1].score, 1);
}

#[test]
fn celebrity_only_input_yields_nothing_in_selective_mode() {
    let e = RankingEngine::new(&cfg(FilterMode::Selective));
    let out = e.rank(
        vec![
            art(0, "Celebrity divorce: the timeline", "Reuters", None),
            art(1, "Prague celebrity divorce", "Tabloid", None),
            art(2, "Another celebrity divorce", "Tabloid", None),
        ],
        now(),
    );
    assert!(out.is_empty());
}

#[test]
fn missing_timestamp_gets_no_freshness_bonus() {
    let e = RankingEngine::new(&cfg(FilterMode::Selective));
    let dated = art(0, "Prague update", "x", Some("2025-03-01T10:00:00Z"));
    let undated = art(1, "Prague update", "x", None);
    assert_eq!(e.score(&dated, now()).unwrap().score, 7);
    assert_eq!(e.score(&undated, now()).unwrap().score, 5);
}

#[test]
fn equal_scores_keep_merged_order() {
    let e = RankingEngine::new(&cfg(FilterMode::Selective));
    let out = e.rank(
        vec![
            art(0, "Energy story A", "x", None),
            art(1, "Prague story", "x", None),
            art(2, "Energy story B", "x", None),
            art(3, "Energy story C", "x", None),
        ],
        now(),
    );
    let titles: Vec<&str> = out.iter().map(|s| s.article.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Prague story", "Energy story A", "Energy story B", "Energy story C"]
    );
}

#[test]
fn blocklisted_never_selected_in_either_mode() {
    let input = || {
        vec![
            art(0, "Prague climate celebrity", "Reuters", Some("2025-03-01T11:00:00Z")),
            art(1, "Quiet afternoon", "Blog", None),
            art(2, "Climate divorce settlement", "x", None),
        ]
    };
    for mode in [FilterMode::Selective, FilterMode::Permissive] {
        let e = RankingEngine::new(&cfg(mode));
        let out = e.rank(input(), now());
        assert!(out.iter().all(|s| !e.is_blocked(&s.article)));
        assert!(out
            .iter()
            .all(|s| !s.article.haystack.contains("celebrity")
                && !s.article.haystack.contains("divorce")));
    }
    // permissive keeps the unmatched one, selective does not
    assert_eq!(
        RankingEngine::new(&cfg(FilterMode::Permissive))
            .rank(input(), now())
            .len(),
        1
    );
    assert!(RankingEngine::new(&cfg(FilterMode::Selective))
        .rank(input(), now())
        .is_empty());
}

#[test]
fn output_is_bounded_sorted_and_stable() {
    let mut c = cfg(FilterMode::Permissive);
    c.digest.max_items = 4;
    let e = RankingEngine::new(&c);

    let titles = [
        "Energy one",
        "Nothing here",
        "Prague energy",
        "Climate talk",
        "Energy two",
        "Prague climate",
        "Nothing again",
    ];
    let input: Vec<Article> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| art(i, t, "x", None))
        .collect();

    let out = e.rank(input, now());
    assert_eq!(out.len(), 4);
    for w in out.windows(2) {
        assert!(w[0].score >= w[1].score);
        if w[0].score == w[1].score {
            assert!(w[0].article.seq < w[1].article.seq);
        }
    }
    let seqs: Vec<usize> = out.iter().map(|s| s.article.seq).collect();
    assert_eq!(seqs, vec![5, 2, 3, 0]);
}

#[test]
fn category_follows_table_order() {
    let e = RankingEngine::new(&cfg(FilterMode::Selective));
    // "summit" is listed under both; politics comes first
    assert_eq!(e.categorize("Prague hosts climate summit"), Category::Politics);
    assert_eq!(e.categorize("Prague hosts climate summit"), Category::Politics);

    let mut swapped = cfg(FilterMode::Selective);
    swapped.categories.reverse();
    let e = RankingEngine::new(&swapped);
    assert_eq!(e.categorize("Prague hosts climate summit"), Category::International);
    assert_eq!(e.categorize("Nothing relevant"), Category::General);
}
