//! C12 — a small, test/demo-only textual encoding for scenario files and
//! `engine_demo`'s synthetic input generator. This is not the production
//! wire format (that's an external collaborator's concern); it exists so
//! integration tests and the demo binary have a human-readable way to
//! describe orders and assert on output, grounded on the same line-oriented,
//! comma-separated shape the teacher's own message codec used.

use crate::engine::InputMsg;
use crate::envelope::OutputMsg;
use crate::types::{OrderType, Price, Side, Symbol};

/// Parses one input line. Returns `Ok(None)` for blank lines or `#` comments.
///
/// Shapes:
/// - `N, <user>, <symbol>, <price>, <qty>, <B|S>, <user_order_id>`
/// - `C, <user>, <user_order_id>`
/// - `F`
pub fn parse_input_line(line: &str) -> Result<Option<InputMsg>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    match fields[0] {
        "N" => {
            if fields.len() != 7 {
                return Err(format!("malformed NewOrder line: {line}"));
            }
            let user_id = fields[1].parse().map_err(|_| format!("bad user id in: {line}"))?;
            let symbol = Symbol::new(fields[2].as_bytes())
                .ok_or_else(|| format!("bad symbol in: {line}"))?;
            let price: Price = fields[3].parse().map_err(|_| format!("bad price in: {line}"))?;
            let quantity = fields[4].parse().map_err(|_| format!("bad quantity in: {line}"))?;
            let side = match fields[5] {
                "B" => Side::Buy,
                "S" => Side::Sell,
                other => return Err(format!("bad side '{other}' in: {line}")),
            };
            let user_order_id = fields[6]
                .parse()
                .map_err(|_| format!("bad user order id in: {line}"))?;
            let kind = if price == 0 {
                OrderType::Market
            } else {
                OrderType::Limit
            };
            Ok(Some(InputMsg::NewOrder {
                symbol,
                user_id,
                user_order_id,
                side,
                kind,
                price,
                quantity,
            }))
        }
        "C" => {
            if fields.len() != 3 {
                return Err(format!("malformed Cancel line: {line}"));
            }
            let user_id = fields[1].parse().map_err(|_| format!("bad user id in: {line}"))?;
            let user_order_id = fields[2]
                .parse()
                .map_err(|_| format!("bad user order id in: {line}"))?;
            Ok(Some(InputMsg::Cancel {
                user_id,
                user_order_id,
            }))
        }
        "F" => Ok(Some(InputMsg::Flush)),
        other => Err(format!("unknown line kind '{other}' in: {line}")),
    }
}

fn side_char(side: Side) -> char {
    match side {
        Side::Buy => 'B',
        Side::Sell => 'S',
    }
}

/// Encodes one output message in the textual shape from §6.
pub fn encode_output(msg: &OutputMsg) -> String {
    match msg {
        OutputMsg::Ack {
            symbol,
            user_id,
            user_order_id,
        } => format!("A, {symbol}, {user_id}, {user_order_id}"),
        OutputMsg::CancelAck {
            symbol,
            user_id,
            user_order_id,
        } => format!("C, {symbol}, {user_id}, {user_order_id}"),
        OutputMsg::Trade {
            symbol,
            buy_user_id,
            buy_user_order_id,
            sell_user_id,
            sell_user_order_id,
            price,
            quantity,
        } => format!(
            "T, {symbol}, {buy_user_id}, {buy_user_order_id}, {sell_user_id}, {sell_user_order_id}, {price}, {quantity}"
        ),
        OutputMsg::TopOfBookUpdate {
            symbol,
            side,
            price,
            qty,
        } => format!("B, {symbol}, {}, {price}, {qty}", side_char(*side)),
        OutputMsg::TopOfBookEliminated { symbol, side } => {
            format!("B, {symbol}, {}, -, -", side_char(*side))
        }
    }
}
