use std::sync::Arc;

use urlrequest::transport::{opt, Transport};
use urlrequest::{Content, UrlRequest};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/".to_string());

    // Pick a backend. With the `libcurl` feature the request goes through
    // libcurl instead of reqwest.
    #[cfg(feature = "libcurl")]
    let transport: Arc<dyn Transport> = Arc::new(urlrequest::transport::CurlTransport::new());
    #[cfg(not(feature = "libcurl"))]
    let transport: Arc<dyn Transport> = Arc::new(urlrequest::transport::ReqwestTransport::new());
    println!("transport: {}", transport.version());

    // Options replace the default "return the body" option, so add it back.
    let mut request = UrlRequest::new(Some(url.as_str()), Some(transport));
    request
        .add_option(opt::RETURN_TRANSFER, true)
        .add_option(opt::FOLLOW_LOCATION, true)
        .add_option(opt::CONNECT_TIMEOUT, 10);

    request.execute()?;
    if request.errno() != 0 {
        anyhow::bail!("request failed ({}): {}", request.errno(), request.error());
    }

    match request.content() {
        Some(Content::Body(body)) => println!("{}", String::from_utf8_lossy(body)),
        other => println!("no body: {other:?}"),
    }
    Ok(())
}
