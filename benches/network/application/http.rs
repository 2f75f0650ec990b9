use crate::network::{Loopback, StepClock};
use criterion::{BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wirestream::network::application::http::Client;

const BODY_LEN: usize = 2048;
const CHUNK_LEN: usize = 256;

fn random_body() -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..BODY_LEN).map(|_| rng.gen_range(b'a'..=b'z')).collect()
}

fn content_length_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn chunked_response(body: &[u8]) -> Vec<u8> {
    let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for chunk in body.chunks(CHUNK_LEN) {
        response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        response.extend_from_slice(chunk);
        response.extend_from_slice(b"\r\n");
    }
    response.extend_from_slice(b"0\r\n\r\n");
    response
}

fn bench_response(c: &mut Criterion, name: &str, response: Vec<u8>) {
    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Bytes(BODY_LEN as u64));
    group.bench_function(name, |b| {
        b.iter_batched_ref(
            || Client::new(Loopback::with_incoming(&response), StepClock::default()),
            |client| {
                client.get("/bench").expect("Failed to send request");
                let status = client.response_status_code().expect("No status");
                assert_eq!(status, 200);
                let body: heapless::Vec<u8, BODY_LEN> =
                    client.response_body().expect("Failed to read body");
                assert_eq!(body.len(), BODY_LEN);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_content_length_body(c: &mut Criterion) {
    bench_response(c, "content_length_body", content_length_response(&random_body()));
}

pub fn bench_chunked_body(c: &mut Criterion) {
    bench_response(c, "chunked_body", chunked_response(&random_body()));
}
