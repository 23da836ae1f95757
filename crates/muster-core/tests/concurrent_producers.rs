// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use muster_core::{AddAgent, Axial, Command, Engine, GridKind, SimConfig};

const PRODUCERS: usize = 4;
const PER_PRODUCER: i32 = 1_000;

#[test]
fn four_producers_account_exactly() {
    let config = SimConfig {
        grid: GridKind::Rect,
        grid_width: 100,
        grid_height: 100,
        max_agents: 8_192,
        command_queue_capacity: 1_024,
        ..SimConfig::default()
    };
    let mut engine = Engine::new(config).expect("config");

    let remaining = Arc::new(AtomicUsize::new(PRODUCERS));
    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let sender = engine.command_sender();
        let remaining = Arc::clone(&remaining);
        handles.push(std::thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                // Each producer owns ten rows, so every spawn cell is unique.
                let at = Axial::new(i % 100, producer as i32 * 10 + i / 100);
                let mut cmd = Command::AddAgent(Box::new(AddAgent::at(at)));
                loop {
                    match sender.submit(cmd) {
                        Ok(()) => break,
                        Err(muster_core::SubmitError::QueueFull { rejected }) => {
                            cmd = rejected;
                            std::thread::yield_now();
                        }
                    }
                }
            }
            remaining.fetch_sub(1, Ordering::Release);
        }));
    }

    // Tick concurrently with the producers, then once more after they join
    // so the last enqueued commands are drained.
    while remaining.load(Ordering::Acquire) > 0 {
        engine.tick();
    }
    for handle in handles {
        handle.join().expect("producer");
    }
    engine.tick();

    let stats = engine.stats();
    assert_eq!(stats.commands_processed, (PRODUCERS * PER_PRODUCER as usize) as u64);
    assert_eq!(stats.active_agents, (PRODUCERS * PER_PRODUCER as usize) as u32);

    let observer = engine.observer();
    assert_eq!(observer.snapshot().agents().len(), PRODUCERS * PER_PRODUCER as usize);
}
