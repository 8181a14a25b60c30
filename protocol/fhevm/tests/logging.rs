use std::sync::{Arc, Mutex};

use ciphertext::{ClearEngine, FheUintType, Handle};
use fhevm::abi::{binary_call, typed_call, word_from_u64};
use fhevm::{run, ExecutionContext, ExecutionMode, FhevmParams};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Records the field names of every event, one comma-joined line per event.
#[derive(Clone, Default)]
struct FieldRecorder(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for FieldRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let names: Vec<&str> = event.metadata().fields().iter().map(|f| f.name()).collect();
        self.0.lock().unwrap().push(names.join(","));
    }
}

impl FieldRecorder {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn has_fields(line: &str, fields: &[&str]) -> bool {
    let names: Vec<&str> = line.split(',').collect();
    fields.iter().all(|f| names.contains(f))
}

#[test]
fn committed_binary_ops_log_their_operands() {
    let recorder = FieldRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut ctx = ExecutionContext::new(
            ClearEngine::new(),
            Arc::new(FhevmParams::default()),
            ExecutionMode::Committing,
        );
        let trivial = "trivialEncrypt(uint256,bytes1)";
        let a = run(&mut ctx, &typed_call(trivial, &word_from_u64(3), FheUintType::FheUint8)).unwrap();
        let b = run(&mut ctx, &typed_call(trivial, &word_from_u64(4), FheUintType::FheUint8)).unwrap();
        let a = Handle::from_slice(&a).unwrap();
        let b = Handle::from_slice(&b).unwrap();

        let add = "fheAdd(uint256,uint256,bytes1)";
        run(&mut ctx, &binary_call(add, a, &b.0, false)).unwrap();
        run(&mut ctx, &binary_call(add, a, &word_from_u64(1), true)).unwrap();
    });

    let lines = recorder.lines();
    assert!(lines.iter().any(|l| has_fields(l, &["method", "lhs", "rhs", "result"])));
    assert!(lines.iter().any(|l| has_fields(l, &["method", "lhs", "scalar", "result"])));
    assert!(lines.iter().any(|l| has_fields(l, &["method", "value", "to", "result"])));
}

#[test]
fn static_calls_do_not_log_success() {
    let recorder = FieldRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut ctx = ExecutionContext::new(
            ClearEngine::new(),
            Arc::new(FhevmParams::default()),
            ExecutionMode::StaticCall,
        );
        let input = typed_call(
            "trivialEncrypt(uint256,bytes1)",
            &word_from_u64(3),
            FheUintType::FheUint8,
        );
        run(&mut ctx, &input).unwrap();
    });

    assert!(recorder.lines().iter().all(|l| !has_fields(l, &["result"])));
}
