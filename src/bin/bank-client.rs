use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use bank_server::protocol::frame::write_frame;
use bank_server::protocol::{Command, FrameReader, REQUEST_FRAME_LEN, RESPONSE_FRAME_LEN, SHUTDOWN_NOTICE};

#[derive(Parser)]
#[command(name = "bank-client")]
#[command(about = "Interactive client for the bank server", long_about = None)]
struct Cli {
    /// Server host name or address.
    host: String,

    /// Server port.
    port: u16,
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "What would you like to do: ")?;
    stdout.flush()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let stream = TcpStream::connect((cli.host.as_str(), cli.port))
        .await
        .map_err(|e| format!("failed to connect to {}:{}: {}", cli.host, cli.port, e))?;
    println!("Connected to {}:{}", cli.host, cli.port);

    let (read_half, mut write_half) = stream.into_split();
    let mut responses = FrameReader::new(read_half, RESPONSE_FRAME_LEN);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;

        // The server may announce shutdown while we wait for input.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            frame = responses.read_frame() => {
                match frame? {
                    Some(text) => {
                        println!("\n{}", text);
                        if text == SHUTDOWN_NOTICE {
                            break;
                        }
                        continue;
                    }
                    None => {
                        println!("\nServer closed the connection");
                        break;
                    }
                }
            }
        };

        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" {
            break;
        }

        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                println!("invalid input: {}", e);
                continue;
            }
        };

        write_frame(&mut write_half, &command.to_string(), REQUEST_FRAME_LEN).await?;
        if command == Command::Quit {
            break;
        }

        match responses.read_frame().await? {
            Some(text) => {
                println!("{}", text);
                if text == SHUTDOWN_NOTICE {
                    break;
                }
            }
            None => {
                println!("Server closed the connection");
                break;
            }
        }
    }

    Ok(())
}
