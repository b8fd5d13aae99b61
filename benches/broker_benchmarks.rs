//! Broker throughput benchmarks.
//!
//! Measures baseline performance of the broker's hot paths:
//! - `attach`/`detach` round-trip cost
//! - single-subscriber publish throughput
//! - fan-out publish across several subscribers

#![allow(clippy::unwrap_used)]

// Layer 1: Standard library imports
use std::hint::black_box;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use criterion::{criterion_group, criterion_main, Criterion};

// Layer 3: Internal module imports
use broker_core::broker::{Broker, BrokerConfig};
use broker_core::message::Message;
use broker_core::subscriber::{Subscriber, SubscriberDescriptor};
use broker_core::util::ModuleHandle;

struct NoopSubscriber;

impl Subscriber for NoopSubscriber {
    fn receive(&self, _message: &Message) {}
}

fn bench_attach_detach(c: &mut Criterion) {
    let broker = Broker::new(BrokerConfig::default()).unwrap();
    c.bench_function("attach_detach_roundtrip", |b| {
        b.iter(|| {
            let handle = ModuleHandle::new();
            broker
                .attach(SubscriberDescriptor::new(handle, Arc::new(NoopSubscriber)))
                .unwrap();
            broker.detach(handle).unwrap();
        });
    });
}

fn bench_publish_single_subscriber(c: &mut Criterion) {
    let broker = Broker::new(BrokerConfig::default()).unwrap();
    let handle = ModuleHandle::new();
    broker
        .attach(SubscriberDescriptor::new(handle, Arc::new(NoopSubscriber)))
        .unwrap();
    let message = Message::from_payload(b"benchmark payload");

    c.bench_function("publish_single_subscriber", |b| {
        b.iter(|| {
            broker.publish(None, black_box(&message)).unwrap();
        });
    });

    broker.detach(handle).unwrap();
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let broker = Broker::new(BrokerConfig::default()).unwrap();
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let handle = ModuleHandle::new();
            broker
                .attach(SubscriberDescriptor::new(handle, Arc::new(NoopSubscriber)))
                .unwrap();
            handle
        })
        .collect();
    let message = Message::from_payload(b"fan-out payload");

    c.bench_function("publish_fan_out_10_subscribers", |b| {
        b.iter(|| {
            broker.publish(None, black_box(&message)).unwrap();
        });
    });

    for handle in handles {
        broker.detach(handle).unwrap();
    }
}

criterion_group!(
    benches,
    bench_attach_detach,
    bench_publish_single_subscriber,
    bench_publish_fan_out
);
criterion_main!(benches);
