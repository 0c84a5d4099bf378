fn main() {
    divan::main();
}

fn recording(file: &str) -> analysis::recording::RecordedMatch {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../testfiles/")
        .join(file);
    let data = std::fs::read_to_string(path).unwrap();

    analysis::recording::RecordedMatch::from_json_lines(&data).unwrap()
}

#[divan::bench(args = ["match.jsonl"])]
fn events(bencher: divan::Bencher, file: &str) {
    let recording = recording(file);
    let config = analysis::Config::default();

    bencher.bench(|| analysis::analyse(divan::black_box(&recording), divan::black_box(&config)));
}

#[divan::bench(args = ["match.jsonl"])]
fn frames(bencher: divan::Bencher, file: &str) {
    let recording = recording(file);
    let config = analysis::Config {
        extract_frames: true,
        ..Default::default()
    };

    bencher.bench(|| analysis::analyse(divan::black_box(&recording), divan::black_box(&config)));
}

#[divan::bench(args = ["match.jsonl"])]
fn decode(bencher: divan::Bencher, file: &str) {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../testfiles/")
        .join(file);
    let data = std::fs::read_to_string(path).unwrap();

    bencher.bench(|| analysis::recording::RecordedMatch::from_json_lines(divan::black_box(&data)));
}
