// Port for the persisted streaming intent

/// Durable "a session should be active" flag.
///
/// Only this flag survives a restart; samples and the current reading are
/// never persisted.
pub trait IntentStore: Send + Sync {
    fn read_intent(&self) -> bool;

    fn write_intent(&self, streaming: bool);
}
