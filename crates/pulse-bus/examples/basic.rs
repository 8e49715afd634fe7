//! Construct a bus, subscribe a couple of RXQs, publish, drain. Run with
//! `cargo run --example basic -p pulse-bus`.

use pulse_bus::{Bus, BusConfig, PoolConfig};
use std::sync::Arc;
use std::thread;

fn main() {
    println!("PULSE bus basic example");
    println!("========================\n");

    let bus = Arc::new(Bus::new(
        BusConfig::new(vec![PoolConfig::new(64, 8), PoolConfig::new(1024, 4)])
            .with_name("demo-bus"),
    ));

    let telemetry_rxq = bus.rxq_init(16).unwrap();
    let logging_rxq = bus.rxq_init(16).unwrap();

    // Both RXQs want pid 1 ("sensor reading"); only logging wants pid 2
    // ("debug trace").
    bus.subscribe(telemetry_rxq, 1).unwrap();
    bus.subscribe(logging_rxq, 1).unwrap();
    bus.subscribe(logging_rxq, 2).unwrap();

    let publisher = {
        let bus = Arc::clone(&bus);
        thread::spawn(move || {
            for i in 0..5u32 {
                bus.publish(1, format!("reading #{i}").as_bytes()).unwrap();
                bus.publish(2, format!("trace #{i}").as_bytes()).unwrap();
            }
        })
    };
    publisher.join().unwrap();

    println!("telemetry consumer (pid 1 only):");
    for _ in 0..5 {
        let entry = bus.rxq_pop_front(telemetry_rxq).unwrap();
        println!("  pid={} bytes={:?}", entry.pid(), String::from_utf8_lossy(entry.bytes()));
    }

    println!("\nlogging consumer (pid 1 and 2, published order per pid preserved):");
    for _ in 0..10 {
        let entry = bus.rxq_pop_front(logging_rxq).unwrap();
        println!("  pid={} bytes={:?}", entry.pid(), String::from_utf8_lossy(entry.bytes()));
    }

    bus.check_destructible()
        .expect("every RXQ was fully drained above");
    println!("\nbus {:?} drained cleanly", bus.name());
}
