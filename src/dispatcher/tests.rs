use super::listener::{Callback, IntoOutcome, Listener, Outcome, Receiver};
use super::namespace::{FlatNamespace, NamespacePolicy, SeparatorNamespace};
use super::options::{DispatcherOptions, FailurePolicy};
use super::record::{Diagnostic, LogRecord, Operation};
use super::topic::{Topic, Topics};
use super::Dispatcher;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn noop() -> Callback {
    Callback::new(|_, _| {})
}

#[test]
fn test_topic_new() {
    let topic = Topic::new("test_topic");
    assert_eq!(topic.name, "test_topic");
    assert!(topic.is_empty());
}

#[test]
fn test_topic_subscribe_keeps_duplicates_in_order() {
    let first = noop();
    let second = noop();
    let mut topic = Topic::new("test_topic");
    topic.subscribe(Listener::new(first.clone(), None, false));
    topic.subscribe(Listener::new(second.clone(), None, true));
    topic.subscribe(Listener::new(first.clone(), None, false));

    assert_eq!(topic.len(), 3);
    assert_eq!(topic.listeners[0].callback, first);
    assert_eq!(topic.listeners[1].callback, second);
    assert!(topic.listeners[1].once);
}

#[test]
fn test_topic_unsubscribe_removes_every_match() {
    let f = noop();
    let g = noop();
    let mut topic = Topic::new("test_topic");
    topic.subscribe(Listener::new(f.clone(), None, false));
    topic.subscribe(Listener::new(g.clone(), None, false));
    topic.subscribe(Listener::new(f.clone(), Some(Arc::new(1u8)), true));

    assert_eq!(topic.unsubscribe(&f), 2);
    assert_eq!(topic.len(), 1);
    assert_eq!(topic.listeners[0].callback, g);
    assert_eq!(topic.unsubscribe(&f), 0);
}

#[test]
fn test_once_listener_claim_is_shared_by_clones() {
    let listener = Listener::new(noop(), None, true);
    let snapshot = listener.clone();

    assert!(listener.try_claim());
    assert!(snapshot.is_claimed());
    assert!(!snapshot.try_claim());

    listener.release();
    assert!(snapshot.try_claim());
}

#[test]
fn test_plain_listener_always_claims() {
    let listener = Listener::new(noop(), None, false);
    assert!(listener.try_claim());
    assert!(listener.try_claim());
    assert!(!listener.is_claimed());
}

#[test]
fn test_topic_clear() {
    let mut topic = Topic::new("test_topic");
    topic.subscribe(Listener::new(noop(), None, false));
    topic.subscribe(Listener::new(noop(), None, false));
    assert_eq!(topic.clear(), 2);
    assert!(topic.is_empty());
}

#[test]
fn test_callback_identity() {
    let f = noop();
    let same = f.clone();
    let other = noop();
    assert!(f.same(&same));
    assert_eq!(f, same);
    assert_ne!(f, other);
}

#[test]
fn test_into_outcome_conversions() {
    assert_eq!(().into_outcome().unwrap(), Outcome::Handled);
    assert_eq!(true.into_outcome().unwrap(), Outcome::Handled);
    assert_eq!(false.into_outcome().unwrap(), Outcome::Declined);
    assert_eq!(
        Ok::<bool, String>(false).into_outcome().unwrap(),
        Outcome::Declined
    );
    let failed = Err::<(), _>("nope").into_outcome().unwrap_err();
    assert_eq!(failed.to_string(), "nope");
}

#[test]
fn test_topics_from_string_splits_on_whitespace() {
    let topics = Topics::from("a  b\tc");
    assert_eq!(topics.names(), ["a", "b", "c"]);
    assert_eq!(topics.len(), 3);
    assert!(topics.is_space_separated());
    assert!(!topics.is_blank());

    let single = Topics::from("a:b");
    assert!(!single.is_space_separated());
}

#[test]
fn test_topics_from_list_is_verbatim() {
    let topics = Topics::from(["a b", "c"]);
    assert_eq!(topics.names(), ["a b", "c"]);
    assert_eq!(topics.len(), 2);
    assert!(!topics.is_space_separated());
}

#[test]
fn test_blank_topics() {
    assert!(Topics::from("").is_blank());
    assert!(Topics::from("   ").is_blank());
    assert!(Topics::from(Vec::<String>::new()).is_blank());
    assert!(Topics::from(["a", ""]).is_blank());
}

#[test]
fn test_separator_namespace_expansion() {
    let ns = SeparatorNamespace::default();
    assert_eq!(
        ns.expand("parent:child:event"),
        vec!["parent", "parent:child", "parent:child:event"]
    );
    assert_eq!(ns.expand("plain"), vec!["plain"]);
    assert_eq!(ns.expand("a::b"), vec!["a", "a:", "a::b"]);
    assert_eq!(ns.expand(":a"), vec!["", ":a"]);
}

#[test]
fn test_custom_separator_and_flat_namespace() {
    assert_eq!(SeparatorNamespace::new('.').expand("a.b"), vec!["a", "a.b"]);
    assert_eq!(SeparatorNamespace::new('.').expand("a:b"), vec!["a:b"]);
    assert_eq!(FlatNamespace.expand("a:b:c"), vec!["a:b:c"]);
}

#[test]
fn test_closure_namespace_policy() {
    let bus = Dispatcher::with_options(DispatcherOptions::default().namespace(
        |topic: &str| -> Vec<String> { vec![topic.to_string(), "*".to_string()] },
    ));
    assert_eq!(bus.event_namespace("x"), vec!["x", "*"]);

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let wildcard = Callback::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    bus.subscribe("*", &wildcard)
        .unwrap()
        .publish("anything", &[])
        .unwrap()
        .publish("else", &[])
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dispatcher_new() {
    let bus = Dispatcher::default();
    assert!(bus.id().starts_with("dispatcher-"));
    assert!(bus.topics().is_empty());
    assert!(!bus.options().strict);
    assert_eq!(bus.options().failure_policy, FailurePolicy::Abort);
}

#[test]
fn test_publish_records_payload_for_each_namespace() {
    let bus = Dispatcher::new();
    bus.publish("a:b", &[json!(1)]).unwrap();
    assert_eq!(bus.last_payload("a"), Some(vec![json!(1)]));
    assert_eq!(bus.last_payload("a:b"), Some(vec![json!(1)]));
    assert_eq!(bus.last_payload("a:b:c"), None);

    bus.publish("a", &[json!(2)]).unwrap();
    assert_eq!(bus.last_payload("a"), Some(vec![json!(2)]));
    assert_eq!(bus.last_payload("a:b"), Some(vec![json!(1)]));
}

#[test]
fn test_once_listener_removed_from_registry() {
    let bus = Dispatcher::new();
    let f = noop();
    bus.once("t", &f).unwrap();
    assert_eq!(bus.listener_count("t"), 1);
    bus.publish("t", &[]).unwrap();
    assert_eq!(bus.listener_count("t"), 0);
    assert!(!bus.has_listeners("t"));
}

#[test]
fn test_unsubscribe_unknown_topic_is_noop() {
    let bus = Dispatcher::new();
    bus.unsubscribe("missing", Some(&noop())).unwrap();
    bus.unsubscribe("missing", None).unwrap();
    assert!(bus.topics().is_empty());
}

#[test]
fn test_topics_lists_only_populated_entries() {
    let bus = Dispatcher::new();
    let f = noop();
    bus.subscribe(["b", "a"], &f).unwrap();
    bus.subscribe("c", &f).unwrap();
    bus.unsubscribe("c", None).unwrap();
    assert_eq!(bus.topics(), vec!["a", "b"]);
}

#[test]
fn test_clear_drops_state() {
    let bus = Dispatcher::new();
    bus.subscribe("t", &noop()).unwrap();
    bus.publish("t", &[json!("x")]).unwrap();
    bus.clear();
    assert_eq!(bus.listener_count("t"), 0);
    assert_eq!(bus.last_payload("t"), None);
}

#[test]
fn test_log_sink_receives_operation_records() {
    let records: Arc<Mutex<Vec<LogRecord>>> = Arc::default();
    let sink = records.clone();
    let bus = Dispatcher::with_options(
        DispatcherOptions::default().log(move |r| sink.lock().unwrap().push(r.clone())),
    );
    let f = noop();

    bus.subscribe("a b", &f)
        .unwrap()
        .publish("a", &[json!(1), json!("two")])
        .unwrap()
        .unsubscribe("a", Some(&f))
        .unwrap();

    let records = records.lock().unwrap();
    let ops: Vec<Operation> = records.iter().map(|r| r.operation).collect();
    assert_eq!(
        ops,
        vec![Operation::Subscribe, Operation::Publish, Operation::Unsubscribe]
    );
    assert_eq!(records[0].topics, vec!["a", "b"]);
    assert_eq!(
        records[0].args,
        json!({ "once": false, "recoup": false, "context": false })
    );
    assert_eq!(records[1].args, json!([1, "two"]));
    assert_eq!(records[2].args, json!({ "callback": true }));
    assert!(records.iter().all(|r| r.dispatcher == bus.id()));
}

#[test]
fn test_log_record_serializes_operation_names() {
    let record = LogRecord::new("d", Operation::Publish, vec!["t".into()], json!([]));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["operation"], "pub");
    assert_eq!(value["topics"], json!(["t"]));
    assert_eq!(Operation::ListenerFailed.to_string(), "listener_failed");
}

#[test]
fn test_invalid_arguments_are_not_logged() {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = count.clone();
    let bus = Dispatcher::with_options(DispatcherOptions::default().log(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(bus.publish("", &[]).is_err());
    assert!(bus.subscribe("", &noop()).is_err());
    assert!(bus.unsubscribe("", None).is_err());
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

fn strict_bus() -> (Dispatcher, Arc<Mutex<Vec<Diagnostic>>>) {
    let seen: Arc<Mutex<Vec<Diagnostic>>> = Arc::default();
    let sink = seen.clone();
    let bus = Dispatcher::with_options(
        DispatcherOptions::default()
            .strict(true)
            .on_warning(move |d| sink.lock().unwrap().push(d.clone())),
    );
    (bus, seen)
}

#[test]
fn test_strict_diagnostics() {
    let (bus, seen) = strict_bus();
    let f = noop();

    bus.subscribe_with("a b", &f, Some(Arc::new("ctx")), Default::default())
        .unwrap();
    bus.publish("a", &[json!(1), json!(2)]).unwrap();
    bus.subscribe("a", &f).unwrap();
    bus.recoup(["b"], &f).unwrap();
    bus.unsubscribe("a", None).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            Diagnostic::BoundContext {
                topics: "a b".into()
            },
            Diagnostic::SpaceSeparatedTopics {
                topics: "a b".into()
            },
            Diagnostic::MultiplePayloadValues {
                topic: "a".into(),
                count: 2
            },
            Diagnostic::AlreadyPublished { topic: "a".into() },
            Diagnostic::RecoupDeprecated { topics: "b".into() },
            Diagnostic::UnsubscribeAll { topics: "a".into() },
        ]
    );
}

#[test]
fn test_diagnostics_silent_when_not_strict() {
    let seen: Arc<Mutex<Vec<Diagnostic>>> = Arc::default();
    let sink = seen.clone();
    let bus = Dispatcher::with_options(
        DispatcherOptions::default().on_warning(move |d| sink.lock().unwrap().push(d.clone())),
    );
    let f = noop();
    bus.subscribe("a b", &f).unwrap();
    bus.publish("a", &[json!(1), json!(2)]).unwrap();
    bus.unsubscribe("a", None).unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_diagnostic_messages() {
    let d = Diagnostic::MultiplePayloadValues {
        topic: "t".into(),
        count: 3,
    };
    assert!(d.to_string().starts_with("pub(): publishing 3 payload values"));
    assert!(d.to_string().ends_with("Re: t"));
}

#[test]
fn test_receiver_defaults_to_dispatcher() {
    let bus = Dispatcher::new();
    let seen = Arc::new(Mutex::new(None::<String>));
    let out = seen.clone();
    let f = Callback::new(move |rx: Receiver<'_>, _| {
        *out.lock().unwrap() = rx.dispatcher().map(|d| d.id().to_string());
    });
    bus.subscribe("t", &f).unwrap().publish("t", &[]).unwrap();
    assert_eq!(seen.lock().unwrap().as_deref(), Some(bus.id()));
}

#[test]
fn test_receiver_uses_bound_context() {
    struct Counter(AtomicUsize);

    let bus = Dispatcher::new();
    let ctx = Arc::new(Counter(AtomicUsize::new(0)));
    let f = Callback::new(|rx: Receiver<'_>, _| {
        assert!(rx.dispatcher().is_none());
        rx.context::<Counter>()
            .expect("bound counter")
            .0
            .fetch_add(1, Ordering::SeqCst);
    });
    bus.subscribe_with("t", &f, Some(ctx.clone()), Default::default())
        .unwrap();
    bus.publish("t", &[]).unwrap().publish("t", &[]).unwrap();
    assert_eq!(ctx.0.load(Ordering::SeqCst), 2);
}
