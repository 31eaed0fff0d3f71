/*!
rpki-rtr-client is a client for the RPKI-to-Router (RTR) protocol, [RFC 6810][rfc6810]
and [RFC 8210][rfc8210].

A router-side RTR client connects to an RPKI cache over TCP, downloads the full
set of validated route origins, then keeps it current with incremental updates.
Every announced or withdrawn origin is handed to a [`RouteSink`] as a
[`RouteChange`].

The crate is layered so each piece can be used alone:

- [`models`]: PDU structs and route-change events
- [`parser`]: PDU decoding/encoding ([`parse_rtr_pdu`], [`RtrEncode`]) and the
  stream [`RtrReassembler`]
- [`client`]: the [`RtrSession`] state machine and the blocking [`RtrClient`] driver

# Examples

Print every change received from a cache until the process is killed:

```rust,no_run
use rpki_rtr_client::{RouteChange, RtrClient, RtrClientConfig};

let config = RtrClientConfig::new("rtr.example.net").with_port(8282);
let mut client = RtrClient::new(config, |change: &RouteChange| println!("{}", change));
client.run().unwrap();
```

Decode PDUs from bytes received out of band:

```rust
use rpki_rtr_client::{RtrPdu, RtrReassembler};

let mut reassembler = RtrReassembler::new();
reassembler.feed(&[0, 3, 0, 7, 0, 0, 0, 8]);
match reassembler.next_pdu().unwrap() {
    Some(RtrPdu::CacheResponse(resp)) => assert_eq!(resp.session_id, 7),
    other => panic!("unexpected {:?}", other),
}
```

[rfc6810]: https://www.rfc-editor.org/rfc/rfc6810
[rfc8210]: https://www.rfc-editor.org/rfc/rfc8210
*/

pub mod client;
pub mod error;
pub mod models;
pub mod parser;

pub use client::{
    LogSink, RouteSink, RtrClient, RtrClientConfig, RtrSession, SessionPhase, StopHandle,
};
pub use error::{RtrClientError, SessionError};
pub use models::*;
pub use parser::{parse_rtr_pdu, read_rtr_pdu, RtrEncode, RtrError, RtrReassembler};
