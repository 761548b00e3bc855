//! A tracing layer that records events for assertions.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt as _};
use tracing_subscriber::util::SubscriberInitExt as _;

/// Captured `[LEVEL] message` lines.
#[derive(Clone, Default)]
pub struct CapturedLogs {
	lines: Arc<Mutex<Vec<String>>>,
}

impl CapturedLogs {
	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().unwrap().clone()
	}

	pub fn contains(&self, level: tracing::Level, needle: &str) -> bool {
		let prefix = format!("[{}]", level);
		self.lines()
			.iter()
			.any(|line| line.starts_with(&prefix) && line.contains(needle))
	}
}

struct LogCapture {
	logs: CapturedLogs,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl Visit for MessageVisitor {
			fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);

		self.logs.lines.lock().unwrap().push(format!(
			"[{}] {}",
			event.metadata().level(),
			visitor.message
		));
	}
}

/// Installs a capturing subscriber for the current thread until the guard
/// is dropped.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
	let logs = CapturedLogs::default();
	let guard = tracing_subscriber::registry()
		.with(LogCapture { logs: logs.clone() })
		.set_default();
	(logs, guard)
}
