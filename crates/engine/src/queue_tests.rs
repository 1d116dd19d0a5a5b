// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use wamprs_core::SessionId;

/// An inert event tagged with a producer id and a sequence number.
fn tagged(producer: u64, seq: u64) -> Event {
    Event::OutboundMessage { destination: SessionId::new(producer), frame: json!([producer, seq]) }
}

fn tag_of(event: &Event) -> (u64, u64) {
    match event {
        Event::OutboundMessage { destination, frame } => {
            (destination.value(), frame[1].as_u64().unwrap())
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn drain_returns_pushed_events_in_fifo_order() {
    let queue = EventQueue::new();
    for seq in 0..5 {
        queue.push(tagged(1, seq)).unwrap();
    }

    let batch = queue.drain();
    let seqs: Vec<u64> = batch.iter().map(|e| tag_of(e).1).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[test]
fn drain_takes_the_whole_backlog() {
    let queue = EventQueue::new();
    queue.push(tagged(1, 0)).unwrap();
    queue.push(tagged(1, 1)).unwrap();

    let batch = queue.drain();
    assert_eq!(batch.len(), 2);
    assert!(queue.is_empty());
}

#[test]
fn push_after_sentinel_is_rejected() {
    let queue = EventQueue::new();
    queue.push(tagged(1, 0)).unwrap();
    queue.push(Event::Shutdown).unwrap();
    assert!(queue.is_closing());

    assert_eq!(queue.push(tagged(1, 1)), Err(QueueError::Closing));
    assert_eq!(queue.push(Event::Shutdown), Err(QueueError::Closing));

    // Nothing landed behind the sentinel.
    let batch = queue.drain();
    assert_eq!(batch.len(), 2);
    assert!(matches!(batch[1], Event::Shutdown));
}

#[test]
fn drain_blocks_until_an_event_arrives() {
    let queue = Arc::new(EventQueue::new());
    let producer_queue = Arc::clone(&queue);

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        producer_queue.push(tagged(7, 0)).unwrap();
    });

    let batch = queue.drain();
    assert_eq!(batch.len(), 1);
    assert_eq!(tag_of(&batch[0]), (7, 0));
    producer.join().unwrap();
}

#[test]
fn fifo_is_preserved_per_producer_across_threads() {
    const PER_PRODUCER: u64 = 200;
    let queue = Arc::new(EventQueue::new());

    let producers: Vec<_> = (1..=3u64)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.push(tagged(producer, seq)).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let mut collected = Vec::new();
    while collected.len() < (3 * PER_PRODUCER) as usize {
        collected.extend(queue.drain());
    }

    let mut last_seq = std::collections::HashMap::new();
    for event in &collected {
        let (producer, seq) = tag_of(event);
        let previous = last_seq.insert(producer, seq);
        if let Some(previous) = previous {
            assert!(seq > previous, "producer {} out of order: {} after {}", producer, seq, previous);
        }
    }
}

#[test]
fn len_tracks_queued_events() {
    let queue = EventQueue::new();
    assert_eq!(queue.len(), 0);
    queue.push(tagged(1, 0)).unwrap();
    queue.push(tagged(1, 1)).unwrap();
    assert_eq!(queue.len(), 2);
    queue.drain();
    assert_eq!(queue.len(), 0);
}
