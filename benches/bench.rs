// Criterion benchmarks for Alumni Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use alumni_match::core::{
    extract::parse_ranking,
    prompt::ranking_prompt,
    recommender::heuristic_ranking,
    scoring::heuristic_score,
};
use alumni_match::models::{AlumniCandidate, StudentProfile};

const SKILLS: [&str; 8] = ["python", "sql", "react", "rust", "go", "ml", "design", "aws"];

fn create_candidate(id: usize) -> AlumniCandidate {
    AlumniCandidate {
        id: format!("alumni{}", id),
        name: format!("Alumnus {}", id),
        position: "Engineer".to_string(),
        company: "Acme".to_string(),
        skills: (0..(id % 6) + 1)
            .map(|i| SKILLS[(id + i) % SKILLS.len()].to_string())
            .collect(),
        interests: vec!["mentoring".to_string()],
        bio: "Happy to help students break into the industry.".to_string(),
    }
}

fn create_student() -> StudentProfile {
    StudentProfile {
        id: "student1".to_string(),
        name: "Student".to_string(),
        skills: vec!["Python".to_string(), "SQL".to_string(), "React".to_string()],
        interests: vec!["ml".to_string()],
        ..Default::default()
    }
}

fn ranker_reply(count: usize) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"id":"alumni{}","score":{},"reasons":["Shared skills","Same industry"]}}"#,
                i,
                95 - (i % 40)
            )
        })
        .collect();
    format!("```json\n[{}]\n```", entries.join(","))
}

fn bench_heuristic_score(c: &mut Criterion) {
    let student = create_student();
    let candidate = create_candidate(5);

    c.bench_function("heuristic_score", |b| {
        b.iter(|| heuristic_score(black_box(&student), black_box(&candidate)));
    });
}

fn bench_heuristic_ranking(c: &mut Criterion) {
    let student = create_student();

    let mut group = c.benchmark_group("heuristic_ranking");

    for candidate_count in [10, 50, 200, 1000].iter() {
        let candidates: Vec<AlumniCandidate> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("rank", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| heuristic_ranking(black_box(&student), black_box(&candidates), black_box(10)));
            },
        );
    }

    group.finish();
}

fn bench_parse_ranking(c: &mut Criterion) {
    let reply = ranker_reply(20);

    c.bench_function("parse_ranking_20_entries", |b| {
        b.iter(|| parse_ranking(black_box(&reply), black_box(10)));
    });
}

fn bench_ranking_prompt(c: &mut Criterion) {
    let student = create_student();
    let candidates: Vec<AlumniCandidate> = (0..20).map(create_candidate).collect();

    c.bench_function("ranking_prompt_20_candidates", |b| {
        b.iter(|| ranking_prompt(black_box(&student), black_box(&candidates), black_box(20)));
    });
}

criterion_group!(
    benches,
    bench_heuristic_score,
    bench_heuristic_ranking,
    bench_parse_ranking,
    bench_ranking_prompt
);

criterion_main!(benches);
