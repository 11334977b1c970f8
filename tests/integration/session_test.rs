//! End-to-end session tests: scheduling, injection and drain against
//! scripted providers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vlmweave::analyzer::{
    AnalysisSession, DrainingSink, Injection, InjectionOutcome, ResourceState, ScheduleOutcome,
    Submission, WorkerConfig, WorkerPool,
};
use vlmweave::sink::{EventLog, OutputEvent};
use vlmweave::{EventSink, ResourceIdentity};

use crate::helpers::{embedded, session_with, timeouts, ScriptedProvider};

fn id(path: &str) -> ResourceIdentity {
    ResourceIdentity::normalize(path)
}

fn block_index(log: &EventLog, resource: &str) -> Option<usize> {
    log.position(|event| match event {
        OutputEvent::StartElement { name, attrs } => {
            name == "div"
                && attrs
                    .iter()
                    .any(|a| a.name == "data-resource" && a.value == resource)
        }
        _ => false,
    })
}

#[test]
#[cfg_attr(miri, ignore)]
fn fast_stalled_and_failing_resources() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .answer(b"a", "A red bicycle leaning on a wall.")
            .stall_on(b"b")
            .fail_on(b"c"),
    );
    let session = session_with(provider.clone(), 3, timeouts(5_000, 200));

    for (bytes, name) in [(&b"a"[..], "a.png"), (&b"b"[..], "b.png"), (&b"c"[..], "c.png")] {
        let outcome = session.on_resource_discovered(bytes, &embedded(name));
        assert!(matches!(outcome, ScheduleOutcome::Scheduled { .. }));
    }

    let mut log = EventLog::new();
    let injection = session.on_reference_point(&mut log, "embedded:/a.png").unwrap();
    assert_eq!(injection, Injection::Written(InjectionOutcome::Analyzed));
    assert!(log.text().contains("A red bicycle leaning on a wall."));

    let report = session.on_document_end(&mut log).unwrap();
    assert_eq!(report.written, 2);
    assert_eq!(report.timed_out, 1);

    let text = log.text();
    assert!(text.contains("[analysis unavailable: analysis timed out"));
    assert!(text.contains("[analysis unavailable: analysis failed (http-status)"));
    assert_eq!(log.count_elements("div", "data-status", "timeout"), 1);
    assert_eq!(log.count_elements("div", "data-status", "error"), 1);

    // Drain follows discovery order
    assert!(block_index(&log, "/b.png") < block_index(&log, "/c.png"));

    assert_eq!(
        session.state_of(&id("/a.png")),
        ResourceState::Injected(InjectionOutcome::Analyzed)
    );
    assert_eq!(
        session.state_of(&id("/b.png")),
        ResourceState::Injected(InjectionOutcome::TimedOut)
    );
    assert_eq!(
        session.state_of(&id("/c.png")),
        ResourceState::Injected(InjectionOutcome::Failed)
    );

    // A late result for the timed-out resource is never written
    provider.release();
    let mut after = EventLog::new();
    assert_eq!(
        session.on_reference_point(&mut after, "/b.png").unwrap(),
        Injection::AlreadyInjected
    );
    assert_eq!(session.on_document_end(&mut after).unwrap().written, 0);
    assert!(after.events().is_empty());
}

#[test]
#[cfg_attr(miri, ignore)]
fn hundred_resources_on_four_workers() {
    let provider = Arc::new(ScriptedProvider::new().delay(Duration::from_millis(2)));
    let session = session_with(provider.clone(), 4, timeouts(10_000, 10_000));

    for i in 0..100 {
        let bytes = format!("img-{}", i).into_bytes();
        session.on_resource_discovered(&bytes[..], &embedded(&format!("img{}.png", i)));
    }

    let mut log = EventLog::new();
    // Inject every third inline, leave the rest for the drain
    for i in (0..100).step_by(3) {
        session
            .on_reference_point(&mut log, &format!("embedded:/img{}.png", i))
            .unwrap();
    }
    let report = session.on_document_end(&mut log).unwrap();
    assert_eq!(report.written, 100 - 34);
    assert_eq!(report.timed_out, 0);

    let mut seen = HashSet::new();
    for event in log.events() {
        if let OutputEvent::StartElement { name, attrs } = event {
            if name != "div" {
                continue;
            }
            if let Some(resource) = attrs.iter().find(|a| a.name == "data-resource") {
                assert!(seen.insert(resource.value.clone()), "{} twice", resource.value);
            }
        }
    }
    assert_eq!(seen.len(), 100);
    assert_eq!(provider.calls(), 100);

    let summary = session.summary();
    assert_eq!(summary.scheduled, 100);
    assert_eq!(summary.injected, 100);
    assert_eq!(summary.analyzed, 100);
}

#[test]
#[cfg_attr(miri, ignore)]
fn drain_is_idempotent() {
    let provider = Arc::new(ScriptedProvider::new());
    let session = session_with(provider, 2, timeouts(5_000, 5_000));
    session.on_resource_discovered(&b"x"[..], &embedded("x.png"));
    session.on_resource_discovered(&b"y"[..], &embedded("y.png"));

    let mut first = EventLog::new();
    assert_eq!(session.on_document_end(&mut first).unwrap().written, 2);

    let mut second = EventLog::new();
    let report = session.on_document_end(&mut second).unwrap();
    assert_eq!(report.written, 0);
    assert!(second.events().is_empty());
}

#[test]
#[cfg_attr(miri, ignore)]
fn read_failure_is_rendered_not_raised() {
    let provider = Arc::new(ScriptedProvider::new());
    let session = session_with(provider.clone(), 1, timeouts(1_000, 1_000));

    let outcome = session.on_resource_read_failed(&embedded("broken.png"), "CRC mismatch");
    assert!(matches!(outcome, ScheduleOutcome::Failed { .. }));
    assert_eq!(
        session.state_of(&id("/broken.png")),
        ResourceState::CompletedError
    );

    let mut log = EventLog::new();
    let injection = session.on_reference_point(&mut log, "broken.png").unwrap();
    assert_eq!(injection, Injection::Written(InjectionOutcome::Failed));
    assert!(log
        .text()
        .contains("[analysis unavailable: resource read failed: CRC mismatch]"));
    assert_eq!(provider.calls(), 0);
}

#[test]
#[cfg_attr(miri, ignore)]
fn reference_wait_is_bounded() {
    let provider = Arc::new(ScriptedProvider::new().stall_on(b"slow"));
    let session = session_with(provider.clone(), 1, timeouts(100, 100));
    session.on_resource_discovered(&b"slow"[..], &embedded("slow.png"));

    let started = Instant::now();
    let mut log = EventLog::new();
    let injection = session.on_reference_point(&mut log, "/slow.png").unwrap();
    assert_eq!(injection, Injection::Written(InjectionOutcome::TimedOut));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(session.summary().timed_out, 1);
    provider.release();
}

#[test]
#[cfg_attr(miri, ignore)]
fn reference_to_unknown_resource_writes_nothing() {
    let session = session_with(Arc::new(ScriptedProvider::new()), 1, timeouts(100, 100));
    let mut log = EventLog::new();
    assert_eq!(
        session.on_reference_point(&mut log, "embedded:/nowhere.png").unwrap(),
        Injection::NotScheduled
    );
    assert!(log.events().is_empty());
}

#[test]
#[cfg_attr(miri, ignore)]
fn draining_sink_drains_before_body_end() {
    let session = session_with(Arc::new(ScriptedProvider::new()), 2, timeouts(5_000, 5_000));
    session.on_resource_discovered(&b"tail"[..], &embedded("tail.png"));

    let mut log = EventLog::new();
    {
        let mut sink = DrainingSink::new(&mut log, &session);
        sink.start_document().unwrap();
        sink.start_element("html", &[]).unwrap();
        sink.start_element("body", &[]).unwrap();
        sink.end_element("body").unwrap();
        sink.end_element("html").unwrap();
        sink.end_document().unwrap();
        assert_eq!(sink.report().map(|r| r.written), Some(1));
    }

    let block = block_index(&log, "/tail.png").expect("drained block");
    let body_end = log
        .position(|e| matches!(e, OutputEvent::EndElement { name } if name == "body"))
        .expect("body end");
    assert!(block < body_end);
}

#[test]
#[cfg_attr(miri, ignore)]
fn saturated_pool_runs_inline_and_still_injects_once() {
    let provider = Arc::new(ScriptedProvider::new().stall_on(b"stall"));
    let pool = WorkerPool::new(&WorkerConfig {
        user_override: Some(1),
        queue_capacity: 1,
        ..Default::default()
    })
    .unwrap();
    let session = AnalysisSession::new(Arc::new(pool), provider.clone(), timeouts(5_000, 5_000));

    // The only worker blocks on the first resource, so the queue fills up
    session.on_resource_discovered(&b"stall"[..], &embedded("stall.png"));
    let names: Vec<String> = (0..5).map(|i| format!("fast-{}.png", i)).collect();
    let mut inline = Vec::new();
    for name in &names {
        let bytes = name.as_bytes().to_vec();
        match session.on_resource_discovered(&bytes[..], &embedded(name)) {
            ScheduleOutcome::Scheduled {
                submission: Submission::CallerRan,
                ..
            } => inline.push(name.clone()),
            ScheduleOutcome::Scheduled { .. } => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    assert!(inline.len() >= 4, "only {} ran inline", inline.len());
    assert_eq!(session.summary().ran_inline, inline.len());

    // Inline results are complete before discovery returns
    let mut log = EventLog::new();
    for name in &inline {
        assert_eq!(session.state_of(&id(&format!("/{}", name))), ResourceState::CompletedOk);
        let injection = session
            .on_reference_point(&mut log, &format!("embedded:/{}", name))
            .unwrap();
        assert_eq!(injection, Injection::Written(InjectionOutcome::Analyzed));
    }

    provider.release();
    let report = session.on_document_end(&mut log).unwrap();
    assert_eq!(report.written, 6 - inline.len());
    assert_eq!(report.timed_out, 0);

    let resources = names.iter().map(String::as_str).chain(["stall.png"]);
    for name in resources {
        let resource = format!("/{}", name);
        assert_eq!(log.count_elements("div", "data-resource", &resource), 1, "{}", resource);
        assert_eq!(
            session.state_of(&id(&resource)),
            ResourceState::Injected(InjectionOutcome::Analyzed)
        );
    }
}
