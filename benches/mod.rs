use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::http::bench_content_length_body,
    network::application::http::bench_chunked_body,
    network::application::websocket::bench_send_message,
    network::application::websocket::bench_receive_message
);
criterion_main!(benches);
