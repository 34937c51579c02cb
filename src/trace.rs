//! Packet-trace CSV reader — the "packet-trace file reader" collaborator.
//!
//! Header row: `protocol,tcp_flags,ip_id,src_addr,src_port,dst_addr,dst_port`
//! (ignored; we don't validate column names, only skip the first line).
//! Only `dst_addr`, `src_port`, `dst_port`, and `protocol` become part of the
//! constructed [`Packet`] — `src_addr` is overridden with a fixed literal
//! standing in for "the local server" every packet is addressed from.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ipid_core::Packet;

/// Stand-in for the benchmark host's own address; every constructed packet's
/// `src_addr` is this literal, not whatever the trace recorded.
const LOCAL_SERVER_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

pub fn load(path: &Path) -> Result<Vec<Packet>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read packet trace: {}", path.display()))?;

    let mut lines = text.lines();
    lines.next(); // header row, ignored

    let local_addr = u32::from(LOCAL_SERVER_ADDR);
    let mut packets = Vec::new();
    for (row_num, line) in lines.enumerate() {
        let line_num = row_num + 2; // +1 for 1-indexing, +1 for the skipped header
        if line.trim().is_empty() {
            continue;
        }
        packets.push(parse_row(line, line_num, local_addr)?);
    }
    Ok(packets)
}

fn parse_row(line: &str, line_num: usize, local_addr: u32) -> Result<Packet> {
    let mut fields: Vec<&str> = line.split(',').collect();

    if fields.len() < 6 {
        bail!("malformed trace row at line {line_num}: fewer than six commas ({line:?})");
    }
    if fields.len() == 6 {
        // Missing trailing dst_port field entirely.
        fields.push("0");
    }
    if fields.len() != 7 {
        bail!("malformed trace row at line {line_num}: expected seven fields, got {} ({line:?})", fields.len());
    }

    let protocol = parse_numeric_field(fields[0], line_num, "protocol")?;
    // fields[1] = tcp_flags, fields[2] = ip_id: not part of Packet.
    let src_port = parse_numeric_field(fields[4], line_num, "src_port")?;
    let dst_addr = parse_addr_field(fields[5], line_num, "dst_addr")?;
    let dst_port = parse_numeric_field(fields[6], line_num, "dst_port")?;

    Ok(Packet::new(local_addr, dst_addr, src_port, dst_port, protocol))
}

fn parse_numeric_field(raw: &str, line_num: usize, field: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .with_context(|| format!("malformed trace row at line {line_num}: bad {field} value {raw:?}"))
}

fn parse_addr_field(raw: &str, line_num: usize, field: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    let addr: Ipv4Addr = raw
        .parse()
        .with_context(|| format!("malformed trace row at line {line_num}: bad {field} value {raw:?}"))?;
    Ok(u32::from(addr))
}
