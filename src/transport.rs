//! WebSocket plumbing that delivers raw geometry payloads.
//!
//! Neither side decodes anything: payloads are handed to a
//! [`GeometryFeedListener`](crate::controller::GeometryFeedListener) on the thread that
//! also runs render ticks. There is no reconnect; after a disconnect the viewer keeps
//! drawing the last mesh it received.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::{JsCast, JsValue};
        use web_sys::{BinaryType, CloseEvent, Event, MessageEvent, WebSocket};

        use crate::controller::GeometryFeedListener;

        /// Open the feed socket; every message goes straight to `listener`.
        ///
        /// The browser dispatches socket callbacks on the same event loop as
        /// `requestAnimationFrame`, so payload handling never overlaps a tick.
        pub fn connect(url: &str, mut listener: GeometryFeedListener) -> Result<WebSocket, JsValue> {
            let ws = WebSocket::new(url)?;
            ws.set_binary_type(BinaryType::Arraybuffer);

            {
                let url = url.to_string();
                let onopen = Closure::wrap(Box::new(move |_e: Event| {
                    tracing::info!(url = %url, "connected to geometry feed");
                }) as Box<dyn FnMut(Event)>);
                ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
                onopen.forget();
            }

            {
                let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
                    let data = e.data();
                    if let Some(text) = data.as_string() {
                        listener.on_payload(&text);
                    } else if let Ok(buf) = data.dyn_into::<js_sys::ArrayBuffer>() {
                        let bytes = js_sys::Uint8Array::new(&buf).to_vec();
                        listener.on_binary_payload(&bytes);
                    } else {
                        tracing::warn!("ignoring feed message with unsupported data type");
                    }
                }) as Box<dyn FnMut(MessageEvent)>);
                ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
                onmessage.forget();
            }

            {
                let onerror = Closure::wrap(Box::new(move |_e: Event| {
                    tracing::warn!("geometry feed socket error");
                }) as Box<dyn FnMut(Event)>);
                ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                onerror.forget();
            }

            {
                let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
                    tracing::warn!(
                        code = e.code(),
                        reason = %e.reason(),
                        clean = e.was_clean(),
                        "geometry feed disconnected"
                    );
                }) as Box<dyn FnMut(CloseEvent)>);
                ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
                onclose.forget();
            }

            Ok(ws)
        }
    } else {
        use std::io;
        use std::thread::{self, JoinHandle};

        use tungstenite::Message;
        use winit::event_loop::EventLoopProxy;

        /// Raw message body as received.
        #[derive(Debug)]
        pub enum FeedPayload {
            Text(String),
            Binary(Vec<u8>),
        }

        /// Feed notifications delivered into the winit event loop.
        #[derive(Debug)]
        pub enum FeedEvent {
            Connected,
            Payload(FeedPayload),
            Disconnected,
        }

        /// Run the blocking WebSocket client on its own thread.
        ///
        /// The thread only forwards bytes; decoding happens in the event loop, which
        /// keeps payload handling on the render thread.
        pub fn spawn_feed(url: String, proxy: EventLoopProxy<FeedEvent>) -> io::Result<JoinHandle<()>> {
            thread::Builder::new()
                .name("geometry-feed".to_string())
                .spawn(move || {
                    match run_feed(&url, &proxy) {
                        Ok(()) => tracing::info!(url = %url, "geometry feed closed"),
                        Err(e) => tracing::error!(error = %e, url = %url, "geometry feed failed"),
                    }
                    let _ = proxy.send_event(FeedEvent::Disconnected);
                })
        }

        fn run_feed(url: &str, proxy: &EventLoopProxy<FeedEvent>) -> Result<(), tungstenite::Error> {
            let (mut socket, _response) = tungstenite::connect(url)?;
            tracing::info!(url = %url, "connected to geometry feed");
            if proxy.send_event(FeedEvent::Connected).is_err() {
                return Ok(());
            }

            loop {
                let payload = match socket.read() {
                    Ok(Message::Text(text)) => FeedPayload::Text(text),
                    Ok(Message::Binary(bytes)) => FeedPayload::Binary(bytes),
                    Ok(Message::Close(_)) | Err(tungstenite::Error::ConnectionClosed) => return Ok(()),
                    // Ping/pong replies are queued by tungstenite itself
                    Ok(_) => continue,
                    Err(e) => return Err(e),
                };
                if proxy.send_event(FeedEvent::Payload(payload)).is_err() {
                    // Event loop has exited
                    return Ok(());
                }
            }
        }
    }
}
