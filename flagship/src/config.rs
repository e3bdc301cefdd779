use std::net::SocketAddr;
use std::ops::Deref;
use std::str::FromStr;

use envconfig::Envconfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl FromStr for FlexBool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(FlexBool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(FlexBool(false)),
            _ => Err(format!("Invalid boolean value: {}", s)),
        }
    }
}

impl From<FlexBool> for bool {
    fn from(flex: FlexBool) -> Self {
        flex.0
    }
}

impl Deref for FlexBool {
    type Target = bool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3001")]
    pub address: SocketAddr,

    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: FlexBool,

    #[envconfig(default = "1000")]
    pub max_concurrency: usize,

    // a fresh process starts with the bootstrap defaults unless told not to
    #[envconfig(from = "SEED_DEMO_FLAGS", default = "true")]
    pub seed_demo_flags: FlexBool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flex_bool_accepts_lenient_values() {
        assert_eq!("yes".parse::<FlexBool>(), Ok(FlexBool(true)));
        assert_eq!("On".parse::<FlexBool>(), Ok(FlexBool(true)));
        assert_eq!("0".parse::<FlexBool>(), Ok(FlexBool(false)));
        assert_eq!("".parse::<FlexBool>(), Ok(FlexBool(false)));
        assert!("banana".parse::<FlexBool>().is_err());
    }
}
