use crate::frame::DataType;

/// A decoded client request. Built positionally from the flattened token
/// sequence of a request array, after the caller has stripped the array's own
/// metadata token: every element contributes a metadata token followed by its
/// payload token, so the command name sits at index 1, the first argument
/// payload at index 3, and the second at index 5.
///
/// This indexing assumes the canonical request shape and nothing else; a
/// request that deviates from it builds `Command::Invalid` rather than being
/// interpreted leniently.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Get(Get),
    Set(Set),
    Ping,
    Echo(Echo),
    /// `quit`/`exit`; the connection loop skips these without replying.
    Exit,
    /// A request that named a known command but did not match its shape.
    Invalid,
    Unknown(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Get {
    pub key: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Set {
    pub key: String,
    /// Type tag of the stored value, taken from the first byte of the value
    /// element's metadata token.
    pub data_type: DataType,
    pub value: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Echo {
    pub value: String,
}

impl Command {
    pub fn from_tokens(tokens: &[String]) -> Command {
        let Some(name) = tokens.get(1) else {
            return Command::Invalid;
        };

        match name.to_lowercase().as_str() {
            "get" => {
                if tokens.len() != 4 {
                    return Command::Invalid;
                }
                Command::Get(Get {
                    key: tokens[3].clone(),
                })
            }
            "set" => {
                if tokens.len() != 6 {
                    return Command::Invalid;
                }
                let Some(&tag) = tokens[4].as_bytes().first() else {
                    return Command::Invalid;
                };
                let Ok(data_type) = DataType::try_from(tag) else {
                    return Command::Invalid;
                };
                Command::Set(Set {
                    key: tokens[3].clone(),
                    data_type,
                    value: tokens[5].clone(),
                })
            }
            "ping" => {
                if tokens.len() != 2 {
                    return Command::Invalid;
                }
                Command::Ping
            }
            "echo" => {
                if tokens.len() != 4 {
                    return Command::Invalid;
                }
                Command::Echo(Echo {
                    value: tokens[3].clone(),
                })
            }
            "quit" | "exit" => Command::Exit,
            _ => Command::Unknown(name.clone()),
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Command::Exit)
    }
}
