use newt_msg::{known, Message};

pub(crate) fn msg_summary(msg: &Message) -> String {
  format!("{:?}: {:?} {} with {} byte payload",
          msg.code.kind(),
          msg.ty,
          msg.code,
          msg.payload.0.len())
}

/// Every option as `number=value`, rendered per the registered value
/// format; unknown options as hex.
pub(crate) fn opts_summary(msg: &Message) -> String {
  msg.opts
     .iter()
     .flat_map(|(number, values)| values.iter().map(move |v| (number, v)))
     .map(|(number, v)| {
       let rendered = known::def(*number).map(|def| def.render(v))
                                         .unwrap_or_else(|| v.to_string());
       format!("{}={}", number.0, rendered)
     })
     .collect::<Vec<_>>()
     .join(" ")
}

#[cfg(test)]
mod tests {
  use newt_msg::known::{no_repeat, repeat};
  use newt_msg::{Code, Id, OptNumber, OptValue, Token, Type};

  use super::*;

  #[test]
  fn summary() {
    let mut msg = Message::new(Type::Ack, Code::new(2, 5), Id(1), Token::default());
    msg.payload.0 = b"hi".to_vec();

    assert_eq!(msg_summary(&msg), "Response: Ack 2.05 with 2 byte payload");
  }

  #[test]
  fn options_render_per_registered_format() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token::default());
    msg.set_uint(no_repeat::OBSERVE, 0);
    msg.set_path("sensors/temperature");
    msg.set(OptNumber(65000), OptValue(vec![0xBE, 0xEF]));

    assert_eq!(opts_summary(&msg),
               "6=0 11=sensors 11=temperature 65000=beef");
  }

  #[test]
  fn no_options_renders_empty() {
    let msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token::default());
    assert_eq!(opts_summary(&msg), "");
  }

  #[test]
  fn opaque_options_render_as_hex() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token::default());
    msg.add(repeat::ETAG, OptValue(vec![0xDE, 0xAD]));

    assert_eq!(opts_summary(&msg), "4=dead");
  }
}
