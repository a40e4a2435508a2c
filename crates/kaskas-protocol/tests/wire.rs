//! End-to-end framing tests: requests through their wire form, and device
//! output through the router and decoder.

use kaskas_protocol::{decode_reply, LineRouter, Request, Response, Routed, Status};

/// Routes `lines` and collects every completed reply.
fn replies(router: &mut LineRouter, lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| match router.route(line) {
            Routed::Reply(reply) => Some(reply),
            _ => None,
        })
        .collect()
}

#[test]
fn test_request_round_trips_through_wire_form() {
    let requests = [
        Request::call("FLU", "waterNow", ["100"]).unwrap(),
        Request::call("MTC", "getMetrics", Vec::<String>::new()).unwrap(),
        Request::call("CLK", "setTime", ["12:30", "", "x y"]).unwrap(),
        Request::call("HTR", "setpoint", [""]).unwrap(),
        Request::print_usage(),
    ];
    for request in requests {
        let wire = String::from_utf8(request.encode()).unwrap();
        assert!(wire.ends_with('\n'));
        assert_eq!(wire.matches('\n').count(), 1, "one line per request");
        let decoded: Request = wire.parse().unwrap();
        assert_eq!(decoded, request, "wire form was {wire:?}");
    }
}

#[test]
fn test_water_now_example() {
    let request = Request::call("FLU", "waterNow", ["100"]).unwrap();
    assert_eq!(request.encode(), b"FLU:waterNow:100\n");

    let mut router = LineRouter::new();
    let reply = replies(&mut router, &["@FLU<OK:DONE>"]);
    let response = decode_reply(&request, &reply[0]).unwrap();
    assert_eq!(response, Response::new(Status::Ok, vec!["DONE".into()]));
}

#[test]
fn test_metrics_example_drops_trailing_field() {
    let request = Request::call("MTC", "getMetrics", Vec::<String>::new()).unwrap();
    let mut router = LineRouter::new();
    let reply = replies(&mut router, &["@MTC<OK:21.5|55.2|19.8|>"]);
    let response = decode_reply(&request, &reply[0]).unwrap();
    assert_eq!(response.arguments(), ["21.5", "55.2", "19.8"]);
}

#[test]
fn test_multiline_example_assembles_value_tail() {
    let request = Request::call("DAQ", "dump", Vec::<String>::new()).unwrap();
    let mut router = LineRouter::new();
    let reply = replies(&mut router, &["@DAQ<OK:foo", "bar>"]);
    assert_eq!(reply, vec!["DAQ<OK:foo\nbar"]);
    let response = decode_reply(&request, &reply[0]).unwrap();
    assert_eq!(response.arguments(), ["foo\nbar"]);
}

#[test]
fn test_reassembly_is_independent_of_line_grouping() {
    // The same device output, delivered as one read or as several reads,
    // routed through a fresh router each time.
    let output = ["#boot", "@DAQ<OK:a|", "!trace", "b|", "c|>", "#idle"];

    let mut whole = LineRouter::new();
    let expected = replies(&mut whole, &output);
    assert_eq!(expected, vec!["DAQ<OK:a|\nb|\nc|"]);

    for split in 1..output.len() {
        let mut router = LineRouter::new();
        let (first, second) = output.split_at(split);
        let mut got = replies(&mut router, first);
        got.extend(replies(&mut router, second));
        assert_eq!(got, expected, "split at {split}");
    }
}

#[test]
fn test_every_line_reaches_exactly_one_sink() {
    let mut router = LineRouter::new();
    let routed: Vec<Routed> = ["#log", "!dbg", "stray", "@A<OK:1", "2>"]
        .iter()
        .map(|line| router.route(line))
        .collect();
    assert_eq!(
        routed,
        vec![
            Routed::Log("log".into()),
            Routed::Debug("dbg".into()),
            Routed::Unrecognized("stray".into()),
            Routed::Pending,
            Routed::Reply("A<OK:1\n2".into()),
        ]
    );
}
