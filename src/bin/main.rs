use std::io::Write;
use std::time::Duration;

use clap::Parser;
use log::error;
use rpki_rtr_client::client::{
    RtrClient, RtrClientConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_RTR_PORT,
};
use rpki_rtr_client::models::{RouteChange, RtrProtocolVersion};
use rpki_rtr_client::parser::rpki::stream::DEFAULT_MAX_PDU_LEN;

/// rtr-client connects to an RPKI cache and prints every route-origin change it receives.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    /// Host name or IP address of the RPKI cache
    #[clap(name = "HOST")]
    host: String,

    /// TCP port of the RPKI cache
    #[clap(short, long, default_value_t = DEFAULT_RTR_PORT)]
    port: u16,

    /// Seconds of silence before polling the cache with a Serial Query
    #[clap(short, long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    refresh: u64,

    /// Protocol version for outgoing queries: 0 (RFC 6810) or 1 (RFC 8210)
    #[clap(long, default_value_t = 0)]
    rtr_version: u8,

    /// Largest PDU accepted from the cache, 0 for no limit
    #[clap(long, default_value_t = DEFAULT_MAX_PDU_LEN)]
    max_pdu_len: usize,

    /// Poll immediately when the cache sends a Serial Notify
    #[clap(long)]
    query_on_notify: bool,

    /// Output as JSON objects
    #[clap(long)]
    json: bool,
}

/// One output line per change: the fixed-width sink line, or a JSON object.
fn format_change(change: &RouteChange, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string(change)
    } else {
        Ok(change.to_string())
    }
}

fn main() {
    let opts: Opts = Opts::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let version = match RtrProtocolVersion::try_from(opts.rtr_version) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("unsupported RTR version {}", opts.rtr_version);
            std::process::exit(1);
        }
    };
    let max_pdu_len = match opts.max_pdu_len {
        0 => None,
        n => Some(n),
    };

    let config = RtrClientConfig::new(opts.host)
        .with_port(opts.port)
        .with_version(version)
        .with_refresh_interval(Duration::from_secs(opts.refresh))
        .with_max_pdu_len(max_pdu_len)
        .with_query_on_notify(opts.query_on_notify);

    let json = opts.json;
    let mut stdout = std::io::stdout();
    let sink = move |change: &RouteChange| {
        let line = match format_change(change, json) {
            Ok(line) => line,
            Err(e) => {
                error!("cannot serialize {:?}: {}", change, e);
                return;
            }
        };
        if let Err(e) = writeln!(stdout, "{}", line) {
            error!("writing to stdout failed: {}", e);
        }
    };

    let mut client = RtrClient::new(config, sink);
    let stop = client.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.stop()) {
        error!("cannot install Ctrl-C handler: {}", e);
    }

    if let Err(e) = client.run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpki_rtr_client::models::{Asn, RouteDirection};

    fn withdraw() -> RouteChange {
        RouteChange {
            direction: RouteDirection::Withdraw,
            prefix: "2001:db8::/32".parse().unwrap(),
            max_length: 48,
            asn: Asn::new(64496),
        }
    }

    #[test]
    fn test_format_change_text() {
        assert_eq!(
            format_change(&withdraw(), false).unwrap(),
            "- 2001:db8::/32        32 -  48  as64496"
        );
    }

    #[test]
    fn test_format_change_json() {
        let line = format_change(&withdraw(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["direction"], "withdraw");
        assert_eq!(value["prefix"], "2001:db8::/32");
        assert_eq!(value["max_length"], 48);
        assert_eq!(value["asn"], 64496);
    }

    #[test]
    fn test_opts_defaults() {
        let opts = Opts::parse_from(["rtr-client", "rtr.example.net"]);
        assert_eq!(opts.host, "rtr.example.net");
        assert_eq!(opts.port, 323);
        assert_eq!(opts.refresh, 1800);
        assert_eq!(opts.rtr_version, 0);
        assert_eq!(opts.max_pdu_len, 65535);
        assert!(!opts.json);
    }
}
