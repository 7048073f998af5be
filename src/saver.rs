use crate::backend::import::BookSource;
use crate::backend::store::Store;
use crate::messages::ResponseMessage;
use crate::state::OpenTicket;
use serde_json::Value;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

pub enum SaverMessage {
    /// Read a book for the open request identified by the ticket
    Read(OpenTicket),
    /// Merge these keys into the data store with a single write
    Persist(Vec<(&'static str, Value)>),
    /// Finish the queued work and stop
    Shutdown,
}

/// Background worker for file reads and data store writes.
///
/// Messages are handled strictly in arrival order, so two saves never
/// interleave and a later save always wins.
pub struct Saver<S> {
    store: Store,
    source: S,
    receiver: Receiver<SaverMessage>,
    response_sender: Sender<ResponseMessage>,
    notify: Box<dyn Fn() + Send>,
}

impl<S: BookSource> Saver<S> {
    pub fn new(
        store: Store,
        source: S,
        receiver: Receiver<SaverMessage>,
        response_sender: Sender<ResponseMessage>,
        notify: Box<dyn Fn() + Send>,
    ) -> Self {
        Self {
            store,
            source,
            receiver,
            response_sender,
            notify,
        }
    }

    pub fn run(&self) {
        while let Ok(message) = self.receiver.recv() {
            let response = match message {
                SaverMessage::Read(ticket) => {
                    debug!("Reading {:?}", ticket.path);
                    let result = self.source.read(&ticket.path);
                    ResponseMessage::BookLoaded { ticket, result }
                }
                SaverMessage::Persist(entries) => {
                    let result = self.store.save_entries(entries).map_err(|e| {
                        error!("Failed to save app data: {}", e);
                        e.to_string()
                    });
                    ResponseMessage::Saved(result)
                }
                SaverMessage::Shutdown => break,
            };
            if self.response_sender.send(response).is_err() {
                break;
            }
            (self.notify)();
        }
        debug!("Saver thread stopped");
    }
}

/// Start the worker. Responses go to `response_sender`; `notify` is called
/// after every response, typically to wake the UI. Joining the handle after
/// [`SaverMessage::Shutdown`] waits for every earlier message.
pub fn spawn_saver<S>(
    store: Store,
    source: S,
    response_sender: Sender<ResponseMessage>,
    notify: impl Fn() + Send + 'static,
) -> (Sender<SaverMessage>, JoinHandle<()>)
where
    S: BookSource + Send + 'static,
{
    let (sender, receiver) = std::sync::mpsc::channel();
    let handle = thread::spawn(move || {
        let saver = Saver::new(store, source, receiver, response_sender, Box::new(notify));
        saver.run();
    });
    (sender, handle)
}
