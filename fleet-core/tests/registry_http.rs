//! HttpRegistry against a throwaway local HTTP listener.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use fleet_core::{HttpRegistry, ProjectName, RegistryClient, RegistryError};

/// Serve exactly one request with `status` and `body`, returning the base URL
/// and the requested path.
fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header");
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write");
        stream.flush().expect("flush");
        request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_string()
    });
    (format!("http://{addr}/"), handle)
}

#[test]
fn lists_projects_from_root() {
    let (base, handle) = serve_once(
        "200 OK",
        r#"{"chains":[{"chain_name":"alpha"},{"chain_name":"beta"}]}"#,
    );
    let client = HttpRegistry::new(base, Duration::from_secs(5));
    let names = client.fetch_all_project_names().expect("list");
    assert_eq!(names, vec![ProjectName::from("alpha"), ProjectName::from("beta")]);
    assert_eq!(handle.join().expect("server"), "/");
}

#[test]
fn fetches_detail_by_name() {
    let (base, handle) = serve_once(
        "200 OK",
        r#"{"chain":{"chain_name":"alpha","daemon_name":"alphad","codebase":{"git_repo":"https://example.com/alpha","recommended_version":"v1.0"}}}"#,
    );
    let client = HttpRegistry::new(base, Duration::from_secs(5));
    let d = client
        .fetch_project_detail(&ProjectName::from("alpha"))
        .expect("detail");
    assert_eq!(d.daemon_name, "alphad");
    assert_eq!(d.recommended_version, "v1.0");
    assert_eq!(handle.join().expect("server"), "/alpha");
}

#[test]
fn non_success_status_is_network_error() {
    let (base, handle) = serve_once("404 Not Found", "{}");
    let client = HttpRegistry::new(base, Duration::from_secs(5));
    let err = client
        .fetch_project_detail(&ProjectName::from("ghost"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Network { .. }), "got: {err}");
    assert!(err.to_string().contains("404"));
    handle.join().expect("server");
}

#[test]
fn malformed_body_is_decode_error() {
    let (base, handle) = serve_once("200 OK", "not json");
    let client = HttpRegistry::new(base, Duration::from_secs(5));
    let err = client.fetch_all_project_names().unwrap_err();
    assert!(matches!(err, RegistryError::Decode { .. }), "got: {err}");
    handle.join().expect("server");
}

#[test]
fn unreachable_registry_is_network_error() {
    // Bind then drop to obtain a port with nothing listening.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").expect("bind");
        l.local_addr().expect("addr").port()
    };
    let client = HttpRegistry::new(format!("http://127.0.0.1:{port}/"), Duration::from_secs(2));
    let err = client.fetch_all_project_names().unwrap_err();
    assert!(matches!(err, RegistryError::Network { .. }), "got: {err}");
}
