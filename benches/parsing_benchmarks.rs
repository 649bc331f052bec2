//! Performance benchmarks for mailtally components.
//!
//! These benchmarks measure token extraction, response splitting and
//! per-record processing so large archive scans stay fast.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use mailtally::archive::{ArchiveRecord, HTTP_RESPONSE_MIME, WarcReader};
use mailtally::http::split_response;
use mailtally::{RecordProcessor, TokenExtractor};

/// Sample HTML body with a handful of addresses
const SAMPLE_HTML: &str = r#"<!doctype html>
<html><head><title>Contact us</title></head>
<body>
<p>Sales: <a href="mailto:sales@example.com">sales@example.com</a></p>
<p>Support: support+web@help.example.co.uk</p>
<p>Press: Press.Office@news.example.org</p>
<footer>&copy; 2024 Example Ltd. All rights reserved.</footer>
</body></html>
"#;

/// Large HTML body with `num_addresses` distinct tokens spread through filler markup
fn generate_large_html(num_addresses: usize) -> String {
    let mut html = String::with_capacity(num_addresses * 120);
    html.push_str("<html><body>\n");
    for i in 0..num_addresses {
        html.push_str(&format!(
            "<div class=\"card\"><span>Person {i}</span> <a href=\"mailto:user{i}@host{}.example.com\">mail</a></div>\n",
            i % 97
        ));
    }
    html.push_str("</body></html>\n");
    html
}

fn html_record(url: &str, body: &str) -> ArchiveRecord {
    let payload = format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{body}");
    ArchiveRecord::new(url, HTTP_RESPONSE_MIME, payload.into_bytes())
}

/// Benchmark token extraction with different body sizes
fn bench_token_extraction(c: &mut Criterion) {
    let extractor = TokenExtractor::init().unwrap();
    let mut group = c.benchmark_group("token_extraction");

    group.bench_function("small_page", |b| {
        b.iter(|| extractor.tokens(black_box(SAMPLE_HTML)).count())
    });

    for size in [100usize, 1_000, 10_000] {
        let html = generate_large_html(size);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("generated_page", size), &html, |b, html| {
            b.iter(|| extractor.tokens(black_box(html)).count())
        });
    }

    group.finish();
}

/// Benchmark HTTP header/body splitting
fn bench_response_split(c: &mut Criterion) {
    let small = html_record("http://a.example/", SAMPLE_HTML);
    let large = html_record("http://a.example/", &generate_large_html(5_000));

    let mut group = c.benchmark_group("response_split");
    group.bench_function("small_record", |b| b.iter(|| split_response(black_box(&small))));
    group.bench_function("large_record", |b| b.iter(|| split_response(black_box(&large))));
    group.finish();
}

/// Benchmark full record processing (split + domain + extraction + dedup)
fn bench_record_processing(c: &mut Criterion) {
    let extractor = TokenExtractor::init().unwrap();
    let records: Vec<ArchiveRecord> = (0..200)
        .map(|i| html_record(&format!("http://site{}.example/page{i}", i % 20), SAMPLE_HTML))
        .collect();

    let mut group = c.benchmark_group("record_processing");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("200_records_20_domains", |b| {
        b.iter(|| {
            let mut processor = RecordProcessor::new(extractor);
            let mut emitted = 0usize;
            for r in &records {
                emitted += processor.process_record(black_box(r)).len();
            }
            emitted
        })
    });
    group.finish();
}

/// Benchmark WARC decoding from memory
fn bench_warc_reading(c: &mut Criterion) {
    let mut data = Vec::new();
    for i in 0..500 {
        let block = format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{SAMPLE_HTML}");
        data.extend_from_slice(
            format!(
                "WARC/1.0\r\nWARC-Target-URI: http://site{i}.example/\r\nContent-Type: {HTTP_RESPONSE_MIME}\r\nContent-Length: {}\r\n\r\n",
                block.len()
            )
            .as_bytes(),
        );
        data.extend_from_slice(block.as_bytes());
        data.extend_from_slice(b"\r\n\r\n");
    }

    let mut group = c.benchmark_group("warc_reading");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("500_records", |b| {
        b.iter(|| WarcReader::new(std::io::Cursor::new(black_box(&data[..])), "bench").count())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_token_extraction,
    bench_response_split,
    bench_record_processing,
    bench_warc_reading
);
criterion_main!(benches);
