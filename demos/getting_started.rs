//! Getting Started Example — Your First Subscriber
//!
//! Demonstrates the full attach/publish/detach workflow: a logging
//! module that counts bytes it has seen, attached to a broker alongside
//! a second, silent module to show source exclusion in action.
//!
//! Run with: cargo run --example getting_started --features transport

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use broker_core::broker::{Broker, BrokerConfig};
use broker_core::message::Message;
use broker_core::subscriber::{Subscriber, SubscriberDescriptor};
use broker_core::util::ModuleHandle;

struct ByteCounter {
    name: &'static str,
    total_bytes: AtomicUsize,
}

impl Subscriber for ByteCounter {
    fn receive(&self, message: &Message) {
        self.total_bytes
            .fetch_add(message.content().len(), Ordering::SeqCst);
        println!(
            "[{}] received {} bytes (running total: {})",
            self.name,
            message.content().len(),
            self.total_bytes.load(Ordering::SeqCst)
        );
    }

    fn start(&self) {
        println!("[{}] attached and ready", self.name);
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let broker = Broker::new(BrokerConfig::default()).expect("broker config is valid");

    let telemetry_handle = ModuleHandle::new();
    let telemetry = Arc::new(ByteCounter {
        name: "telemetry",
        total_bytes: AtomicUsize::new(0),
    });
    broker
        .attach(SubscriberDescriptor::new(
            telemetry_handle,
            telemetry.clone(),
        ))
        .expect("attach telemetry module");

    let logger_handle = ModuleHandle::new();
    let logger = Arc::new(ByteCounter {
        name: "logger",
        total_bytes: AtomicUsize::new(0),
    });
    broker
        .attach(SubscriberDescriptor::new(logger_handle, logger.clone()))
        .expect("attach logger module");

    let mut props = HashMap::new();
    props.insert("event".to_string(), "startup".to_string());
    let message = Message::try_create(b"gateway online", props).expect("valid message");

    // Published as if from the telemetry module itself: telemetry will
    // not see its own message, only the logger will.
    broker
        .publish(Some(telemetry_handle), &message)
        .expect("publish succeeds");

    std::thread::sleep(Duration::from_millis(50));

    broker.detach(telemetry_handle).expect("detach telemetry");
    broker.detach(logger_handle).expect("detach logger");

    println!(
        "final totals — telemetry: {}, logger: {}",
        telemetry.total_bytes.load(Ordering::SeqCst),
        logger.total_bytes.load(Ordering::SeqCst)
    );
}
