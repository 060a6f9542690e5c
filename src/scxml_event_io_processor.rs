use std::fmt::Debug;
#[cfg(test)]
use std::println as info;

#[cfg(not(test))]
use log::info;
use log::error;

use crate::datamodel::{GlobalDataArc, SCXML_EVENT_PROCESSOR};
/// See https://www.w3.org/TR/scxml/#SCXMLEventProcessor

use crate::event_io_processor::{EventIOProcessor, EventIOProcessorHandle};
use crate::fsm::{Event, EventType, SessionId};

/// SCXML Processors specific target:\
/// If the target is the special term '#_internal', the Processor must add the event to the internal event queue of the sending session.
pub const SCXML_TARGET_INTERNAL: &str = "#_internal";

/// SCXML Processors specific target:\
/// If the target is the special term '#_scxml_sessionid', where sessionid is the id of an SCXML session that is accessible to the Processor,
/// the Processor must add the event to the external queue of that session.
pub const SCXML_TARGET_SESSION_ID_PREFIX: &str = "#_scxml_";

/// SCXML Processors specific target:\
/// If the target is the special term '#_parent', the Processor must add the event to the external event queue of the SCXML session that
/// invoked the sending session, if there is one.
pub const SCXML_TARGET_PARENT: &str = "#_parent";

/// SCXML Processors specific target:\
/// If the target is the special term '#_invokeid', where invokeid is the invokeid of an SCXML session that the sending session has created
/// by <invoke>, the Processor must add the event to the external queue of that session.\
/// This value is a prefix of the other SCXML targets and needs special care.
pub const SCXML_TARGET_INVOKE_ID_PREFIX: &str = "#_";

/// Shortcut for the SCXML I/O Processor type.
pub const SCXML_TYPE: &str = "scxml";

#[derive(Debug)]
pub struct ScxmlEventIOProcessor {
    pub location: String,
    pub handle: EventIOProcessorHandle,
}

impl ScxmlEventIOProcessor {
    pub fn new() -> ScxmlEventIOProcessor {
        info!("Scxml Event Processor starting");

        let e = ScxmlEventIOProcessor
        {
            location: SCXML_TARGET_SESSION_ID_PREFIX.to_string(),
            handle: EventIOProcessorHandle::new(),
        };
        e
    }

    fn send_to_session(&mut self, global: &GlobalDataArc, session_id: SessionId, event: Event) -> bool {
        let mut lock = global.lock();
        match &lock.executor {
            None => {
                panic!("Executor not set");
            }
            Some(executor) => {
                let event_name = event.name.clone();
                match executor.send_to_session(session_id, event) {
                    Ok(_) => true,
                    Err(_err) => {
                        error!("Can't send '{}' to session {}", event_name, session_id);
                        lock.enqueue_internal(Event::error_communication());
                        false
                    }
                }
            }
        }
    }

    /// W3C: If the sending SCXML session specifies a session that does not exist or is inaccessible,
    /// the SCXML Processor must place the error 'error.communication' on the internal event queue of the
    /// sending session.
    fn dispatch(&mut self, global: &GlobalDataArc, target: &str, mut event: Event) -> bool {
        match target {
            "" | SCXML_TARGET_INTERNAL => {
                // Empty target and '#_internal' both add to the external queue of the
                // sending session; only <raise> posts to the internal queue, and it
                // bypasses this processor entirely.
                let mut lock = global.lock();
                event.etype = EventType::external;
                lock.externalQueue.enqueue(Box::new(event));
                true
            }
            SCXML_TARGET_PARENT => {
                let parent = global.lock().parent_session_id;
                match parent {
                    Some(session_id) => self.send_to_session(global, session_id, event),
                    None => {
                        error!("Send target '{}': session has no parent.", target);
                        global.lock().enqueue_internal(Event::error_communication());
                        false
                    }
                }
            }
            _ if target.starts_with(SCXML_TARGET_SESSION_ID_PREFIX) => {
                match target[SCXML_TARGET_SESSION_ID_PREFIX.len()..].parse::<SessionId>() {
                    Ok(session_id) => self.send_to_session(global, session_id, event),
                    Err(_err) => {
                        error!("Send target '{}' has wrong format.", target);
                        global.lock().enqueue_internal(Event::error_communication());
                        false
                    }
                }
            }
            _ if target.starts_with(SCXML_TARGET_INVOKE_ID_PREFIX) => {
                let invoke_id = &target[SCXML_TARGET_INVOKE_ID_PREFIX.len()..];
                let session_id = global.lock().child_sessions.get(invoke_id).map(|s| s.session_id);
                match session_id {
                    Some(session_id) => self.send_to_session(global, session_id, event),
                    None => {
                        error!("InvokeId '{}' of target '{}' is not available.", invoke_id, target);
                        global.lock().enqueue_internal(Event::error_communication());
                        false
                    }
                }
            }
            _ => {
                error!("Send target '{}' is unknown or invalid.", target);
                global.lock().enqueue_internal(Event::error_communication());
                false
            }
        }
    }
}

const TYPES: &[&str] = &[SCXML_EVENT_PROCESSOR, SCXML_TYPE];

impl EventIOProcessor for ScxmlEventIOProcessor {
    fn get_location(&self, session_id: SessionId) -> String {
        format!("{}{}", self.location, session_id)
    }

    /// Returns the type of this processor.
    fn get_types(&self) -> &[&str] { TYPES }

    fn get_handle(&mut self) -> &mut EventIOProcessorHandle {
        &mut self.handle
    }

    fn get_copy(&self) -> Box<dyn EventIOProcessor> {
        let b = ScxmlEventIOProcessor {
            location: self.location.clone(),
            handle: self.handle.clone(),
        };
        Box::new(b)
    }

    /// W3C: (only the relevant parts)\
    /// Generated Events:
    /// <ul>
    /// <li>The 'origin' field of the event raised in the receiving session must match the value of the
    /// 'location' field inside the entry for the SCXML Event I/O Processor in the _ioprocessors
    ///  system variable in the sending session.</li>
    /// <li>The 'origintype' field of the event raised in the receiving session must have the value "scxml".</li>
    /// </ul>
    /// SCXML Processors must support the following special targets for \<send\>:
    /// <ul>
    /// <li>#_internal: add the event to the internal event queue of the sending session.</li>
    /// <li>#_scxml_sessionid: add the event to the external queue of that session.</li>
    /// <li>#_parent: add the event to the external event queue of the session that invoked the sending session.</li>
    /// <li>#_invokeid: add the event to the external queue of the session created by \<invoke\> with that id.</li>
    /// <li>If neither 'target' nor 'targetexpr' is given, add the event to the external event queue of the sending session.</li>
    /// </ul>
    fn send(&mut self, global: &GlobalDataArc, target: &str, mut event: Event) -> bool {
        event.origin_type = Some(SCXML_TYPE.to_string());
        if event.origin.is_none() {
            let session_id = global.lock().session_id;
            event.origin = Some(self.get_location(session_id));
        }
        self.dispatch(global, target, event)
    }

    /// This processor doesn't really need a shutdown.
    /// The implementation does nothing.
    fn shutdown(&mut self) {
        info!("Scxml Event IO Processor shutdown...");
        self.handle.shutdown();
    }
}
