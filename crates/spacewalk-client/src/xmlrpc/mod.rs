//! Minimal XML-RPC encoding and decoding
//!
//! Only what the up2date handshake needs: method calls with string
//! parameters, and responses made of scalars, structs and arrays.

use std::borrow::Cow;

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while decoding an XML-RPC response
#[derive(Error, Debug)]
pub enum XmlRpcError {
    #[error("server fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type XmlRpcResult<T> = Result<T, XmlRpcError>;

/// An XML-RPC value
///
/// Numbers keep the text they were received as next to the parsed value;
/// login fields are signed by the server over that exact text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int { value: i64, text: String },
    Bool(bool),
    Double { value: f64, text: String },
    Struct(IndexMap<String, Value>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Scalar as text for an HTTP header, numbers exactly as received
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int { text, .. } | Value::Double { text, .. } => Some(text.clone()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Struct(_) | Value::Array(_) | Value::Nil => None,
        }
    }
}

/// Encode a method call whose parameters are all strings
pub fn encode_call(method: &str, params: &[&str]) -> String {
    let mut body = String::from("<?xml version='1.0'?>\n<methodCall>\n");
    body.push_str(&format!("<methodName>{}</methodName>\n<params>\n", escape(method)));
    for param in params {
        body.push_str(&format!(
            "<param>\n<value><string>{}</string></value>\n</param>\n",
            escape(*param)
        ));
    }
    body.push_str("</params>\n</methodCall>\n");
    body
}

/// Decode a method response into its single return value
pub fn decode_response(xml: &str) -> XmlRpcResult<Value> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodResponse")?;

    match parser.next_start()?.as_str() {
        "params" => {
            parser.expect_start("param")?;
            parser.expect_start("value")?;
            parser.parse_value()
        }
        "fault" => {
            parser.expect_start("value")?;
            let fault = parser.parse_value()?;
            let members = fault
                .as_struct()
                .ok_or_else(|| XmlRpcError::Malformed("fault is not a struct".to_string()))?;
            let code = members
                .get("faultCode")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            let message = members
                .get("faultString")
                .and_then(Value::to_text)
                .unwrap_or_default();
            Err(XmlRpcError::Fault { code, message })
        }
        other => Err(XmlRpcError::Malformed(format!("unexpected element <{}>", other))),
    }
}

/// Start, end or text token relevant to XML-RPC
enum Token {
    Start(String),
    Empty(String),
    End(String),
    Text(String),
    Eof,
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        Self { reader }
    }

    fn next_token(&mut self) -> XmlRpcResult<Token> {
        loop {
            let token = match self.reader.read_event()? {
                Event::Start(e) => Token::Start(name_of(e.name().as_ref())),
                Event::Empty(e) => Token::Empty(name_of(e.name().as_ref())),
                Event::End(e) => Token::End(name_of(e.name().as_ref())),
                Event::Text(t) => Token::Text(t.unescape()?.into_owned()),
                Event::CData(c) => {
                    Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned())
                }
                Event::Eof => Token::Eof,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            };
            return Ok(token);
        }
    }

    fn next_start(&mut self) -> XmlRpcResult<String> {
        match self.next_token()? {
            Token::Start(name) => Ok(name),
            other => Err(unexpected("an opening tag", &other)),
        }
    }

    fn expect_start(&mut self, tag: &str) -> XmlRpcResult<()> {
        let name = self.next_start()?;
        if name == tag {
            Ok(())
        } else {
            Err(XmlRpcError::Malformed(format!("expected <{}>, found <{}>", tag, name)))
        }
    }

    fn expect_end(&mut self, tag: &str) -> XmlRpcResult<()> {
        match self.next_token()? {
            Token::End(name) if name == tag => Ok(()),
            other => Err(unexpected(&format!("</{}>", tag), &other)),
        }
    }

    /// Text content up to the closing `tag`
    fn read_text(&mut self, tag: &str) -> XmlRpcResult<String> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(name) if name == tag => return Ok(text),
                other => return Err(unexpected(&format!("text inside <{}>", tag), &other)),
            }
        }
    }

    /// Parse the content of a `<value>` whose opening tag was consumed,
    /// including its closing tag
    fn parse_value(&mut self) -> XmlRpcResult<Value> {
        let value = match self.next_token()? {
            // Untyped values are strings
            Token::Text(text) => {
                self.expect_end("value")?;
                return Ok(Value::String(text));
            }
            Token::End(name) if name == "value" => return Ok(Value::String(String::new())),
            Token::Empty(name) => match name.as_str() {
                "nil" => Value::Nil,
                "struct" => Value::Struct(IndexMap::new()),
                "array" => Value::Array(Vec::new()),
                _ => Value::String(String::new()),
            },
            Token::Start(name) => self.parse_typed(&name)?,
            other => return Err(unexpected("a value", &other)),
        };
        self.expect_end("value")?;
        Ok(value)
    }

    fn parse_typed(&mut self, kind: &str) -> XmlRpcResult<Value> {
        match kind {
            "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(self.read_text(kind)?)),
            "int" | "i4" | "i8" => {
                let text = self.read_text(kind)?.trim().to_string();
                let value = text
                    .parse()
                    .map_err(|_| XmlRpcError::Malformed(format!("invalid integer '{}'", text)))?;
                Ok(Value::Int { value, text })
            }
            "boolean" => Ok(Value::Bool(self.read_text(kind)?.trim() == "1")),
            "double" => {
                let text = self.read_text(kind)?.trim().to_string();
                let value = text
                    .parse()
                    .map_err(|_| XmlRpcError::Malformed(format!("invalid double '{}'", text)))?;
                Ok(Value::Double { value, text })
            }
            "nil" => {
                self.expect_end("nil")?;
                Ok(Value::Nil)
            }
            "struct" => self.parse_struct(),
            "array" => self.parse_array(),
            other => Err(XmlRpcError::Malformed(format!("unknown value type <{}>", other))),
        }
    }

    fn parse_struct(&mut self) -> XmlRpcResult<Value> {
        let mut members = IndexMap::new();
        loop {
            match self.next_token()? {
                Token::Start(name) if name == "member" => {
                    self.expect_start("name")?;
                    let key = self.read_text("name")?;
                    self.expect_start("value")?;
                    let value = self.parse_value()?;
                    self.expect_end("member")?;
                    members.insert(key, value);
                }
                Token::End(name) if name == "struct" => return Ok(Value::Struct(members)),
                other => return Err(unexpected("<member> or </struct>", &other)),
            }
        }
    }

    fn parse_array(&mut self) -> XmlRpcResult<Value> {
        let mut items = Vec::new();
        match self.next_token()? {
            Token::Empty(name) if name == "data" => {}
            Token::Start(name) if name == "data" => loop {
                match self.next_token()? {
                    Token::Start(name) if name == "value" => items.push(self.parse_value()?),
                    Token::End(name) if name == "data" => break,
                    other => return Err(unexpected("<value> or </data>", &other)),
                }
            },
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_end("array")?;
        Ok(Value::Array(items))
    }
}

fn name_of(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn unexpected(expected: &str, found: &Token) -> XmlRpcError {
    let found: Cow<'_, str> = match found {
        Token::Start(name) => format!("<{}>", name).into(),
        Token::Empty(name) => format!("<{}/>", name).into(),
        Token::End(name) => format!("</{}>", name).into(),
        Token::Text(text) => format!("text '{}'", text).into(),
        Token::Eof => "end of document".into(),
    };
    XmlRpcError::Malformed(format!("expected {}, found {}", expected, found))
}
