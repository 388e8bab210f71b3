//! DIAL client: discover devices, then launch YouTube on the first one
//!
//! Run with: cargo run -p dial --example dial_client

use std::sync::Arc;
use std::time::Duration;

use dial::{ClientConfig, DialClient, DialError, ObserverEvent, UdpSsdpPeer};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), DialError> {
    dial::logging::init_logging_from_env()?;

    let (tx, mut events) = mpsc::unbounded_channel();
    let config = ClientConfig::new().with_request_timeout(Duration::from_secs(5));
    let client = DialClient::new(Arc::new(UdpSsdpPeer::default()), tx, config)?;
    client.start().await?;

    while let Some(event) = events.recv().await {
        match event {
            ObserverEvent::Ready => println!("DIAL client is ready"),
            ObserverEvent::Found { location, .. } => {
                println!("DIAL device found, requesting description from {}", location);
                let device = match client.get_dial_device(&location).await {
                    Ok(device) => device,
                    Err(e) => {
                        eprintln!("Error on get DIAL device description from {}: {}", location, e);
                        continue;
                    }
                };
                println!(
                    "Got {} ({}), apps at {}",
                    device.friendly_name().unwrap_or("unnamed device"),
                    device.model_name().unwrap_or("unknown model"),
                    device.application_url()
                );

                match device.get_app("YouTube").await {
                    Ok(info) => println!("YouTube is {}", info.state),
                    Err(e) => {
                        eprintln!("YouTube is not available on {}: {}", location, e);
                        continue;
                    }
                }

                match device.launch_app("YouTube", Some("v=YE7VzlLtp-4"), Some("text/plain")).await {
                    Ok(_) => println!("YouTube launched successfully"),
                    Err(e) => eprintln!("Error on launch YouTube: {}", e),
                }
                break;
            }
            ObserverEvent::Disappeared { location, .. } => {
                println!("DIAL device {} disappeared", location)
            }
            ObserverEvent::Stopped => println!("DIAL client is stopped"),
        }
    }

    client.stop().await?;
    Ok(())
}
