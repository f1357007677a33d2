pub mod client;
pub mod provision;
pub mod verify;

pub use client::ArtifactDownloader;
pub use provision::{ensure_artifact, MAX_DOWNLOAD_TRIES};
pub use verify::{sha1_file, verify};

#[cfg(test)]
pub(crate) mod testing {
    //! One-shot HTTP responders on a local port.

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    pub type Requests = Arc<Mutex<Vec<String>>>;

    /// Serve `responses` in order, one per connection. Returns the base URL
    /// and the raw request heads as they arrive.
    pub fn serve(responses: Vec<Vec<u8>>) -> (String, Requests) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        std::thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).into_owned());
                let _ = stream.write_all(&response);
            }
        });

        (format!("http://127.0.0.1:{port}"), requests)
    }

    pub fn ok_body(body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    pub fn status(code: u16, reason: &str) -> Vec<u8> {
        format!("HTTP/1.1 {code} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .into_bytes()
    }
}
