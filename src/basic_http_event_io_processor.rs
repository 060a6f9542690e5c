//! I/O Processor implementation for type "http://www.w3.org/TR/scxml/#BasicHTTPEventProcessor".\
//! See [W3C:SCXML - Basic HTTP Event I/O Processor](https://www.w3.org/TR/scxml/#BasicHTTPEventProcessor).\
//! Included if feature "BasicHttpEventIOProcessor" is enabled.\
//! This implementation is based on Rocket, but can be used as template for implementations based on other frameworks.\
//! The event input form is only added for test & debugging and should not be used in production.

use std::collections::HashMap;
use std::fmt::Debug;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use rocket::http::ContentType;
use rocket::response::content::RawHtml;
use rocket::response::Responder;
use rocket::{post, route, routes, Config, Request, Response, Shutdown};

#[cfg(test)]
use std::println as info;
#[cfg(not(test))]
use log::info;
use log::{debug, error};

use crate::datamodel::{Data, GlobalDataArc, BASIC_HTTP_EVENT_PROCESSOR};
use crate::event_io_processor::{EventIOProcessor, EventIOProcessorHandle};
use crate::fsm::{Event, EventType, SessionId};
use crate::fsm_executor::ExecuteState;

pub const SCXML_EVENT_NAME: &str = "_scxmleventname";
pub const SCXML_EVENT_CONTENT: &str = "_content";

/// IO Processor that serves basic http requests.\
/// See https://www.w3.org/TR/scxml/#BasicHTTPEventProcessor \
/// If the feature is active, this IO Processor is automatically added by FsmExecutor.
#[derive(Debug, Clone)]
pub struct BasicHTTPEventIOProcessor {
    pub shutdown_guard: Shutdown,
    pub location: String,
    pub handle: EventIOProcessorHandle,
    pub executor_state: Arc<Mutex<ExecuteState>>,
}

fn data_to_form_value(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[post("/scxml/<sessionid>", data = "<params>")]
fn rocket_receive_event(
    sessionid: u32,
    params: rocket::form::Form<HashMap<String, String>>,
    executor_state: &rocket::State<Arc<Mutex<ExecuteState>>>,
) -> (rocket::http::Status, String) {
    let form_data = params.into_inner();

    let state = executor_state.lock().unwrap();
    match state.sessions.get(&sessionid) {
        None => (
            rocket::http::Status::BadRequest,
            format!("Session {} not found", sessionid),
        ),
        Some(scxml_session) => {
            let mut event_name: Option<String> = None;
            let mut content: Option<String> = None;
            let mut params: HashMap<String, Data> = HashMap::new();

            for (name, value) in form_data {
                match name.as_str() {
                    SCXML_EVENT_NAME => event_name = Some(value),
                    SCXML_EVENT_CONTENT => content = Some(value),
                    _ => {
                        params.insert(name, Data::String(value));
                    }
                }
            }
            match event_name {
                None => (
                    rocket::http::Status::BadRequest,
                    format!("Missing argument '{}'", SCXML_EVENT_NAME),
                ),
                Some(name) => {
                    let event = Event {
                        name,
                        etype: EventType::external,
                        sendid: "".to_string(),
                        origin: None,
                        origin_type: None,
                        invoke_id: None,
                        param_values: if params.is_empty() { None } else { Some(params) },
                        content,
                    };

                    debug!("Sending HTTP Event '{}'", event);
                    match scxml_session.sender.send(Box::new(event)) {
                        Ok(_) => (rocket::http::Status::Ok, "Event send".to_string()),
                        Err(err) => {
                            error!("Failed to send event: {}", err);
                            (
                                rocket::http::Status::InternalServerError,
                                "Can't send".to_string(),
                            )
                        }
                    }
                }
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut etxt = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '&' => etxt.push_str("&amp;"),
            '>' => etxt.push_str("&gt;"),
            '<' => etxt.push_str("&lt;"),
            '"' => etxt.push_str("&quot;"),
            '\'' => etxt.push_str("&#39;"),
            _ => etxt.push(c),
        };
    }
    etxt
}

struct ImageResponse {
    content_type: ContentType,
    data: &'static [u8],
}

impl<'r> Responder<'r, 'static> for ImageResponse {
    fn respond_to(self, _r: &'r Request<'_>) -> rocket::response::Result<'static> {
        Response::build()
            .header(self.content_type)
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

#[route(GET, uri = "/favicon.svg")]
fn rocket_get_favicon() -> ImageResponse {
    let favicon = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>
<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"64\" height=\"64\" version=\"1.1\">
<rect x=\"0\" y=\"0\" width=\"64\" height=\"64\" fill=\"#F2E292\"/>
<g><text font-family=\"Arial\" font-size=\"37\" x=\"3\" y=\"38\" stroke=\"lightgray\" fill=\"#60605D\" \
stroke-width=\"0.2\">fsm</text></g></svg>";
    ImageResponse {
        content_type: ContentType::SVG,
        data: favicon.as_bytes(),
    }
}

#[route(GET, uri = "/")]
fn rocket_welcome(executor_state: &rocket::State<Arc<Mutex<ExecuteState>>>) -> RawHtml<String> {
    let mut sessions = String::with_capacity(100);

    let state = executor_state.lock().unwrap();
    for k in state.sessions.keys() {
        sessions.push_str("<option value='");
        sessions.push_str(&escape_html(&k.to_string()));
        sessions.push_str("'></option>");
    }
    drop(state);

    let mut page_source = String::new();
    page_source.push_str("\
  <html><head>
  <title>Finite State Machine - Basic HTTP IO Processor</title>
  <link rel='shortcut icon' href='/favicon.svg' type='image/svg+xml'>
  </head>
  <style>body{font-family:Helvetica;}.x{ font-size: 1.2em;}</style>
  <script>
    async function submitEvent(event)
    {
        event.preventDefault();
        const formData = new URLSearchParams();
        const eventName = document.getElementById('eventName').value.trim();
        const sessionId = document.getElementById('sessionId').value.trim();
        if (sessionId.length > 0 && eventName.length > 0) {
            formData.append('_scxmleventname', eventName );
            const url = '/scxml/' + encodeURIComponent(sessionId);
            try {
                let response = await fetch( url, {
                   method: 'POST',
                   headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
                   body: formData.toString() }
                );
                let result = await response.text();
                document.getElementById('responseField').value = result;
            } catch (error) {
               document.getElementById('responseField').value = 'Error: '+error;
            }
        }
    };
  </script>
  <body>
    <h3>I am a BasicHTTPEventIOProcessor</h3>
    <p class='x'>Please send some event to my FSMs!</p>
    <form onsubmit='submitEvent(event)'><table>
     <tr><td><label for='eventName'>Name of Event</label></td><td><input class='x' type='text' id='eventName' name='eventName'><br/></td></tr>
     <tr><td><label for='sessionId'>Id of FSM-Session</label></td>
       <td><input class='x' type='text' list='sessions' id='sessionId' name='sessionId'><datalist id='sessions'>");
    page_source.push_str(sessions.as_str());
    page_source.push_str(
        "</datalist></td></tr>
      <tr><td colspan='2'><br><button type='submit'>Send Event</button></td></tr>
    </table></form>
    <h3>Response from BasicHTTPEventIOProcessor:</h3>
    <textarea id='responseField' rows='10' cols='50'></textarea>
    </body></html>",
    );

    RawHtml(page_source)
}

impl BasicHTTPEventIOProcessor {
    pub async fn new(
        ip_addr: IpAddr,
        location_name: &str,
        port: u16,
        executor_state: Arc<Mutex<ExecuteState>>,
    ) -> BasicHTTPEventIOProcessor {
        let es_clone = executor_state.clone();

        let figment = rocket::Config::figment();
        #[cfg(feature = "Debug")]
        let figment = figment.merge(Config::debug_default());
        #[cfg(not(feature = "Debug"))]
        let figment = figment.merge(Config::release_default());

        let figment = figment
            .merge(("port", port))
            .merge(("shutdown.ctrlc", false));

        let server = rocket::custom(figment)
            .manage(es_clone)
            .mount(
                "/",
                routes![rocket_welcome, rocket_receive_event, rocket_get_favicon],
            )
            .ignite()
            .await
            .expect("server to launch");
        let shutdown = server.shutdown();

        tokio::spawn(async move { server.launch().await });
        info!("HTTP server started at {}:{}", ip_addr, port);

        BasicHTTPEventIOProcessor {
            shutdown_guard: shutdown,
            location: format!("http://{}:{}/scxml/", location_name, port),
            handle: EventIOProcessorHandle::new(),
            executor_state,
        }
    }
}

const TYPES: &[&str] = &[BASIC_HTTP_EVENT_PROCESSOR, "basichttp"];

impl EventIOProcessor for BasicHTTPEventIOProcessor {
    fn get_location(&self, session_id: SessionId) -> String {
        format!("{}{}", self.location, session_id)
    }

    /// Returns the type of this processor.
    fn get_types(&self) -> &[&str] {
        TYPES
    }

    fn get_handle(&mut self) -> &mut EventIOProcessorHandle {
        &mut self.handle
    }

    fn get_copy(&self) -> Box<dyn EventIOProcessor> {
        let b = BasicHTTPEventIOProcessor {
            shutdown_guard: self.shutdown_guard.clone(),
            location: self.location.clone(),
            handle: self.handle.clone(),
            executor_state: self.executor_state.clone(),
        };
        Box::new(b)
    }

    /// *W3C says*:\
    /// B.2.9 Serialization\
    /// In certain circumstances, e.g. when including data in events sent via the BasicHTTP Event I/O Processor,
    /// the SCXML Processor is required to serialize data from the ECMAScript data model for transmission to a remote entity.
    /// In such cases, if the Processor supports JSON, and is able to serialize the data in sufficient detail to allow its
    /// reconstruction, the Processor MUST serialize the data to JSON. Otherwise, the Processor MAY use platform-specific
    /// methods (including JSON despite the loss of information) to serialize the data.
    fn send(&mut self, _global: &GlobalDataArc, target: &str, event: Event) -> bool {
        debug!("Send HTTP Event {}", event.name);

        let mut data: Vec<(String, String)> = Vec::new();
        data.push((SCXML_EVENT_NAME.to_string(), event.name));
        if let Some(parameters) = &event.param_values {
            for (name, value) in parameters {
                data.push((name.clone(), data_to_form_value(value)));
            }
        }
        if let Some(content) = &event.content {
            data.push((SCXML_EVENT_CONTENT.to_string(), content.clone()));
        }
        let form_data: Vec<(&str, &str)> = data
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        match ureq::post(target).send_form(form_data.as_slice()) {
            Ok(_) => true,
            Err(err) => {
                error!("Failed to send to {}. {}", target, err);
                false
            }
        }
    }

    fn shutdown(&mut self) {
        info!("HTTP Event IO Processor shutdown...");
        self.shutdown_guard.clone().notify();
        self.handle.shutdown();
    }
}
