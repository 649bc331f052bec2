//! Library-level pipeline tests: processor instances feeding the shuffle and
//! sum aggregation the way a distributed host would drive them.

use mailtally::archive::HTTP_RESPONSE_MIME;
use mailtally::{
    AggregateResult, ArchiveRecord, Observation, RecordProcessor, Shuffle, TokenExtractor, WarcReader,
    aggregate,
};

fn html_record(url: &str, body: &str) -> ArchiveRecord {
    let payload =
        format!("HTTP/1.1 200 OK\r\nServer: test\r\nContent-Type: text/html\r\n\r\n{body}");
    ArchiveRecord::new(url, HTTP_RESPONSE_MIME, payload.into_bytes())
}

fn new_processor() -> RecordProcessor {
    RecordProcessor::new(TokenExtractor::init().expect("token pattern compiles"))
}

#[test]
fn end_to_end_two_domains_two_instances() {
    let mut first = new_processor();
    let mut second = new_processor();

    let obs_a = first.process_record(&html_record(
        "http://a.example/",
        "Contact: foo@bar.com or foo@bar.com again",
    ));
    assert_eq!(obs_a, vec![Observation::one("foo@bar.com")]);

    let after_one: Shuffle = obs_a.iter().cloned().collect();
    assert_eq!(
        after_one.reduce(),
        vec![AggregateResult {
            token: "foo@bar.com".to_string(),
            total: 1
        }]
    );

    let obs_b = second.process_record(&html_record("http://b.example/", "foo@bar.com"));
    let after_two: Shuffle = obs_a.into_iter().chain(obs_b).collect();
    let results = after_two.reduce();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].total, 2);
}

#[test]
fn same_instance_second_domain_adds_one() {
    let mut p = new_processor();
    let mut all = p.process_record(&html_record(
        "http://a.example/",
        "Contact: foo@bar.com or foo@bar.com again",
    ));
    all.extend(p.process_record(&html_record("http://b.example/", "foo@bar.com")));

    let total = aggregate("foo@bar.com", all.iter().map(|o| o.count));
    assert_eq!(total.total, 2);
}

#[test]
fn mixed_partition_counters() {
    let mut p = new_processor();
    let records = vec![
        ArchiveRecord::new("http://a.example/", "application/warc-fields", b"x@y.org".to_vec()),
        ArchiveRecord::new(
            "http://a.example/",
            HTTP_RESPONSE_MIME,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nno-separator@y.org".to_vec(),
        ),
        ArchiveRecord::new(
            "http://a.example/logo.png",
            HTTP_RESPONSE_MIME,
            b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n\r\nimg@y.org".to_vec(),
        ),
        html_record("http://a.example/", "one@y.org two@y.org one@y.org"),
        html_record("not-a-url", "three@y.org"),
    ];

    let emitted: Vec<Observation> = records.iter().flat_map(|r| p.process_record(r)).collect();
    let tokens: Vec<&str> = emitted.iter().map(|o| o.token.as_str()).collect();
    assert_eq!(tokens, vec!["one@y.org", "two@y.org"]);

    let c = p.counters();
    assert_eq!(c.records_seen, 5);
    assert_eq!(c.records_in, 2);
    assert_eq!(c.exceptions, 2);
    assert_eq!(c.observations, 2);
}

#[test]
fn fresh_instance_reproduces_partition() {
    let records = vec![
        html_record("http://a.example/", "a@x.org b@x.org"),
        html_record("http://b.example/", "a@x.org"),
        html_record("http://a.example/2", "b@x.org c@x.org"),
    ];
    let run = || {
        let mut p = new_processor();
        records
            .iter()
            .flat_map(|r| p.process_record(r))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn overlong_available_length_is_skipped_and_next_record_counts() {
    let mut p = new_processor();
    let mut short = html_record("http://a.example/", "lost@y.org");
    short.available_length = short.payload.len() + 1;

    assert!(p.process_record(&short).is_empty());
    let c = p.counters();
    assert_eq!(c.exceptions, 1);
    assert_eq!(c.records_in, 0);

    let next = p.process_record(&html_record("http://a.example/", "kept@y.org"));
    assert_eq!(next, vec![Observation::one("kept@y.org")]);
    assert_eq!(p.counters().records_in, 1);
    assert_eq!(p.counters().exceptions, 1);
}

#[test]
fn record_without_target_uri_is_skipped() {
    let block = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\nnobody@y.org";
    let warc = format!(
        "WARC/1.0\r\nWARC-Type: response\r\nContent-Type: {HTTP_RESPONSE_MIME}\r\nContent-Length: {}\r\n\r\n{block}\r\n\r\n",
        block.len()
    );
    let records: Vec<ArchiveRecord> = WarcReader::new(warc.as_bytes(), "no-uri.warc")
        .collect::<Result<_, _>>()
        .expect("well-formed archive");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), "");

    let mut p = new_processor();
    assert!(p.process_record(&records[0]).is_empty());
    let c = p.counters();
    assert_eq!(c.records_in, 1);
    assert_eq!(c.exceptions, 1);
    assert_eq!(c.observations, 0);
    assert!(p.dedup_table().is_empty());
}
