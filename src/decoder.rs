//! C++ decoder header for a [`Connection`].
//!
//! Emits one `Message` subclass per message and a `Base<Name>Decoder`
//! with an overridable `handle` per message plus a dispatching
//! `handle(const Message&)` that checks the decoder magic and switches
//! on the message id.

use crate::generator::{GeneratorOptions, HEADER};
use crate::protocol::{Connection, Message};

/// Render the decoder header.
#[must_use]
pub fn render(connection: &Connection, options: &GeneratorOptions) -> String {
    let mut out = Lines {
        out: String::new(),
        indent: &options.indent,
    };
    if options.header {
        out.line(0, HEADER);
    }
    out.line(0, "#pragma once");
    out.blank();
    out.line(0, "#include <libipc/Message.h>");
    out.line(0, "#include <memory>");

    for message in &connection.messages {
        out.blank();
        message_class(&mut out, connection.magic, message);
    }

    out.blank();
    decoder_class(&mut out, connection);
    out.out
}

fn message_class(out: &mut Lines<'_>, magic: i32, message: &Message) {
    let class = class_name(message);
    out.line(0, &format!("class {class} : public Message {{"));
    out.line(0, "public:");

    let params: Vec<_> = message
        .fields
        .iter()
        .map(|f| format!("{} {}", f.ty, f.name))
        .collect();
    out.line(1, &format!("{class}({})", params.join(", ")));
    for (i, field) in message.fields.iter().enumerate() {
        let lead = if i == 0 { ':' } else { ',' };
        out.line(2, &format!("{lead} m_{0}({0})", field.name));
    }
    out.line(1, "{");
    out.line(1, "}");
    out.blank();

    out.line(
        1,
        &format!("int decoder_magic() const override {{ return {magic}; }}"),
    );
    out.line(
        1,
        &format!("int id() const override {{ return {}; }}", message.id),
    );
    if let Some(key) = message.key_field() {
        out.line(
            1,
            &format!(
                "message_key_t key() const override {{ return m_{}; }}",
                key.name
            ),
        );
    }
    if let Some(reply) = message.reply {
        out.line(
            1,
            &format!("int reply_id() const override {{ return {reply}; }}"),
        );
    }
    for (i, field) in message.fields.iter().enumerate() {
        // the key field is read through key()
        if message.key == Some(i) {
            continue;
        }
        out.line(
            1,
            &format!("{} {}() const {{ return m_{}; }}", field.ty, field.name, field.name),
        );
    }

    if !message.fields.is_empty() {
        out.blank();
        out.line(0, "private:");
        for field in &message.fields {
            out.line(1, &format!("{} m_{};", field.ty, field.name));
        }
    }
    out.line(0, "};");
}

fn decoder_class(out: &mut Lines<'_>, connection: &Connection) {
    let class = format!("Base{}Decoder", connection.name);
    out.line(0, &format!("class {class} {{"));
    out.line(0, "public:");
    out.line(1, &format!("{class}() = default;"));
    out.line(1, &format!("virtual ~{class}() = default;"));
    out.blank();
    out.line(
        1,
        &format!("int magic() const {{ return {}; }}", connection.magic),
    );
    out.blank();

    out.line(1, "std::unique_ptr<Message> handle(const Message& msg)");
    out.line(1, "{");
    out.line(2, "if (msg.decoder_magic() != magic()) {");
    out.line(3, "return nullptr;");
    out.line(2, "}");
    out.line(2, "switch (msg.id()) {");
    for message in &connection.messages {
        out.line(2, &format!("case {}:", message.id));
        out.line(
            3,
            &format!(
                "return handle(static_cast<const {}&>(msg));",
                class_name(message)
            ),
        );
    }
    out.line(2, "default:");
    out.line(3, "return nullptr;");
    out.line(2, "}");
    out.line(1, "}");

    if !connection.messages.is_empty() {
        out.blank();
    }
    for message in &connection.messages {
        out.line(
            1,
            &format!(
                "virtual std::unique_ptr<Message> handle(const {}&) {{ return nullptr; }}",
                class_name(message)
            ),
        );
    }
    out.line(0, "};");
}

fn class_name(message: &Message) -> String {
    format!("{}Message", message.name)
}

struct Lines<'a> {
    out: String,
    indent: &'a str,
}

impl Lines<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}
