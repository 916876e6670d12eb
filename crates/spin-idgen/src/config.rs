use anyhow::bail;
use clap::{Parser, ValueEnum};
use spin_pk::{GenMethod, IdGeneratorConfig, IdType, ProviderKind};

/// Runtime configuration for the `spin-idgen` binary.
///
/// Every flag can also be set through the environment (or a `.env` file), so
/// the same binary can be pointed at a host's `idgen.properties`, an IP table
/// or a fixed machine id without changing its invocation.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "spin-idgen",
    version,
    about = "Generates Snowflake-style distributed ids"
)]
pub struct CliArgs {
    /// Machine id strategy: `property`, `external` or `ip`.
    ///
    /// `MACHINE_ID` in the environment overrides whatever the strategy
    /// resolves.
    ///
    /// Environment variable: `MACHINE_ID_PROVIDER`
    #[arg(long, env = "MACHINE_ID_PROVIDER", default_value_t = String::from("external"))]
    pub provider: String,

    /// Parameters handed to the strategy, e.g. `machineId=7`,
    /// `ips=10.0.0.1,10.0.0.2` or `configFile=/etc/spin/idgen.properties`.
    ///
    /// Environment variable: `MACHINE_ID_INIT_PARAMS`
    #[arg(long, env = "MACHINE_ID_INIT_PARAMS", default_value_t = String::new())]
    pub init_params: String,

    /// Id layout: 0 for second granularity (max peak), 1 for millisecond
    /// granularity.
    ///
    /// Environment variable: `ID_TYPE`
    #[arg(long, env = "ID_TYPE", default_value_t = 0)]
    pub id_type: u64,

    /// Generation method recorded in each id: 0 embedded, 1 central server,
    /// 2 REST API.
    ///
    /// Environment variable: `GEN_METHOD`
    #[arg(long, env = "GEN_METHOD", default_value_t = 0)]
    pub gen_method: u64,

    /// Layout version bit.
    ///
    /// Environment variable: `ID_VERSION`
    #[arg(long, env = "ID_VERSION", default_value_t = 0)]
    pub id_version: u64,

    /// Number of ids to print.
    ///
    /// Environment variable: `COUNT`
    #[arg(short = 'n', long, env = "COUNT", default_value_t = 1)]
    pub count: u64,

    /// Print every field of each id next to it.
    #[arg(short, long, default_value_t = false)]
    pub explain: bool,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct IdGenConfig {
    pub generator: IdGeneratorConfig,
    pub count: u64,
    pub explain: bool,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for IdGenConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let provider: ProviderKind = match args.provider.parse() {
            Ok(provider) => provider,
            Err(e) => bail!("MACHINE_ID_PROVIDER: {e}"),
        };
        let id_type = match IdType::try_from(args.id_type) {
            Ok(id_type) => id_type,
            Err(e) => bail!("ID_TYPE: {e}"),
        };
        let gen_method = match GenMethod::try_from(args.gen_method) {
            Ok(gen_method) => gen_method,
            Err(e) => bail!("GEN_METHOD: {e}"),
        };
        if args.id_version > 1 {
            bail!("ID_VERSION must be 0 or 1, got {}", args.id_version);
        }
        if args.count == 0 {
            bail!("COUNT must be greater than 0");
        }

        Ok(Self {
            generator: IdGeneratorConfig::new(provider, args.init_params)
                .with_id_type(id_type)
                .with_gen_method(gen_method)
                .with_version(args.id_version),
            count: args.count,
            explain: args.explain,
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<IdGenConfig> {
        let args =
            CliArgs::try_parse_from(std::iter::once("spin-idgen").chain(args.iter().copied()))?;
        IdGenConfig::try_from(args)
    }

    #[test]
    fn flags_map_onto_generator_config() {
        let config = parse(&[
            "--provider",
            "property",
            "--init-params",
            "machineId=7",
            "--id-type",
            "1",
            "--gen-method",
            "2",
            "--id-version",
            "1",
            "-n",
            "3",
            "--explain",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(
            config.generator,
            IdGeneratorConfig::new(ProviderKind::Property, "machineId=7")
                .with_id_type(IdType::MinGranularity)
                .with_gen_method(GenMethod::RestApi)
                .with_version(1)
        );
        assert_eq!(config.count, 3);
        assert!(config.explain);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse(&["--provider", "zookeeper"]).is_err());
        assert!(parse(&["--id-type", "2"]).is_err());
        assert!(parse(&["--gen-method", "3"]).is_err());
        assert!(parse(&["--id-version", "2"]).is_err());
        assert!(parse(&["--count", "0"]).is_err());
    }
}
