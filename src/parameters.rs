//! One-shot parameter load for controller gains and loop timing.
//!
//! Layers, lowest to highest priority: TOML file < `PREFETCH_CTL_*`
//! environment variables < explicit CLI flags. Anything still missing
//! after all three layers is a fatal [`ConfigError::MissingKey`].

use std::path::Path;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::shared::{ExecutionMode, MembershipFamily};

/// Raw, TOML-shaped configuration. Every field is optional here so that a
/// partial file plus env/CLI overrides can still assemble a complete
/// [`AllParameters`]; the required-key check happens in [`AllParameters::finish`].
#[derive(Debug, Default, Deserialize)]
pub struct RawParameters {
    #[serde(rename = "ControllerType")]
    pub controller_type: Option<String>,
    #[serde(rename = "ExecutionType")]
    pub execution_type: Option<String>,
    #[serde(rename = "Kp")]
    pub kp: Option<f64>,
    #[serde(rename = "Ki")]
    pub ki: Option<f64>,
    #[serde(rename = "Kd")]
    pub kd: Option<f64>,
    #[serde(rename = "Direction")]
    pub direction: Option<f64>,
    #[serde(rename = "Alfa")]
    pub alfa: Option<f64>,
    #[serde(rename = "Beta")]
    pub beta: Option<f64>,
    #[serde(rename = "Deadzone")]
    pub deadzone: Option<f64>,
    #[serde(rename = "HysteresisBand")]
    pub hysteresis_band: Option<f64>,
    #[serde(rename = "Min")]
    pub min: Option<f64>,
    #[serde(rename = "Max")]
    pub max: Option<f64>,
    #[serde(rename = "PC")]
    pub pc: Option<f64>,
    #[serde(rename = "DeltaTime")]
    pub delta_time: Option<f64>,
    #[serde(rename = "MonitorTime")]
    pub monitor_time: Option<f64>,
    #[serde(rename = "SetPoints")]
    pub set_points: Option<Vec<u64>>,
    #[serde(rename = "SampleSizePerLevel")]
    pub sample_size_per_level: Option<u64>,
    #[serde(rename = "MembershipFunction")]
    pub membership_function: Option<String>,
    #[serde(rename = "DeffuzificationMethod")]
    pub deffuzification_method: Option<String>,
    #[serde(rename = "QueueName")]
    pub queue_name: Option<String>,
    #[serde(rename = "RabbitMQHost")]
    pub rabbitmq_host: Option<String>,
    #[serde(rename = "RabbitMQPort")]
    pub rabbitmq_port: Option<u16>,
    #[serde(rename = "NumberOfClients")]
    pub number_of_clients: Option<usize>,
    #[serde(rename = "NumberOfRequests")]
    pub number_of_requests: Option<usize>,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
    #[serde(rename = "StdDev")]
    pub std_dev: Option<f64>,
    #[serde(rename = "MessageSize")]
    pub message_size: Option<usize>,
    #[serde(rename = "OutputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "DockerDir")]
    pub docker_dir: Option<String>,
}

impl RawParameters {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overlay environment variables (`PREFETCH_CTL_<FIELD>`, upper snake
    /// case) onto whatever the file already populated. Parse failures on an
    /// env var are ignored in favour of the file value — only presence of a
    /// syntactically valid override counts.
    pub fn overlay_env(mut self) -> Self {
        macro_rules! env_f64 {
            ($field:ident, $key:literal) => {
                if let Ok(v) = std::env::var($key) {
                    if let Ok(v) = v.parse() {
                        self.$field = Some(v);
                    }
                }
            };
        }
        macro_rules! env_string {
            ($field:ident, $key:literal) => {
                if let Ok(v) = std::env::var($key) {
                    self.$field = Some(v);
                }
            };
        }

        env_string!(controller_type, "PREFETCH_CTL_CONTROLLER_TYPE");
        env_string!(execution_type, "PREFETCH_CTL_EXECUTION_TYPE");
        env_f64!(kp, "PREFETCH_CTL_KP");
        env_f64!(ki, "PREFETCH_CTL_KI");
        env_f64!(kd, "PREFETCH_CTL_KD");
        env_f64!(direction, "PREFETCH_CTL_DIRECTION");
        env_f64!(alfa, "PREFETCH_CTL_ALFA");
        env_f64!(beta, "PREFETCH_CTL_BETA");
        env_f64!(deadzone, "PREFETCH_CTL_DEADZONE");
        env_f64!(hysteresis_band, "PREFETCH_CTL_HYSTERESIS_BAND");
        env_f64!(min, "PREFETCH_CTL_MIN");
        env_f64!(max, "PREFETCH_CTL_MAX");
        env_f64!(pc, "PREFETCH_CTL_PC");
        env_f64!(delta_time, "PREFETCH_CTL_DELTA_TIME");
        env_f64!(monitor_time, "PREFETCH_CTL_MONITOR_TIME");
        env_string!(membership_function, "PREFETCH_CTL_MEMBERSHIP_FUNCTION");
        env_string!(deffuzification_method, "PREFETCH_CTL_DEFFUZIFICATION_METHOD");
        env_string!(queue_name, "PREFETCH_CTL_QUEUE_NAME");
        env_string!(rabbitmq_host, "PREFETCH_CTL_RABBITMQ_HOST");
        env_string!(output_file, "PREFETCH_CTL_OUTPUT_FILE");
        env_string!(docker_dir, "PREFETCH_CTL_DOCKER_DIR");

        self
    }

    pub fn finish(self) -> Result<AllParameters, ConfigError> {
        macro_rules! required {
            ($field:ident, $name:literal) => {
                self.$field.ok_or(ConfigError::MissingKey($name))?
            };
        }

        let controller_type = required!(controller_type, "ControllerType");
        let execution_type_raw = required!(execution_type, "ExecutionType");
        let execution_type = ExecutionMode::parse(&execution_type_raw)
            .ok_or_else(|| ConfigError::UnknownExecutionType(execution_type_raw.clone()))?;

        let membership_function = match self.membership_function {
            Some(ref s) => Some(
                MembershipFamily::parse(s)
                    .ok_or_else(|| ConfigError::UnknownMembershipFunction(s.clone()))?,
            ),
            None => None,
        };

        let set_points = self.set_points.unwrap_or_default();
        if matches!(
            execution_type,
            ExecutionMode::ExperimentClosedLoop | ExecutionMode::ClosedLoop
        ) && set_points.is_empty()
        {
            return Err(ConfigError::EmptySetpointSchedule);
        }

        Ok(AllParameters {
            controller_type,
            execution_type,
            kp: self.kp.unwrap_or(0.0),
            ki: self.ki.unwrap_or(0.0),
            kd: self.kd.unwrap_or(0.0),
            direction: self.direction.unwrap_or(1.0),
            alfa: self.alfa.unwrap_or(1.0),
            beta: self.beta.unwrap_or(1.0),
            deadzone: self.deadzone.unwrap_or(0.0),
            hysteresis_band: self.hysteresis_band.unwrap_or(0.0),
            min: required!(min, "Min"),
            max: required!(max, "Max"),
            pc: required!(pc, "PC"),
            delta_time: self.delta_time.unwrap_or(1.0),
            monitor_time: self.monitor_time.unwrap_or(1.0),
            set_points,
            sample_size_per_level: self.sample_size_per_level.unwrap_or(1),
            membership_function,
            deffuzification_method: self.deffuzification_method,
            queue_name: self.queue_name.unwrap_or_else(|| "adaptive-moms".to_string()),
            rabbitmq_host: self.rabbitmq_host.unwrap_or_else(|| "localhost".to_string()),
            rabbitmq_port: self.rabbitmq_port.unwrap_or(5672),
            number_of_clients: self.number_of_clients.unwrap_or(1),
            number_of_requests: self.number_of_requests.unwrap_or(0),
            mean: self.mean.unwrap_or(0.0),
            std_dev: self.std_dev.unwrap_or(0.0),
            message_size: self.message_size.unwrap_or(256),
            output_file: self.output_file.unwrap_or_else(|| "output.csv".to_string()),
            docker_dir: self.docker_dir.unwrap_or_else(|| ".".to_string()),
        })
    }
}

/// The fully resolved parameter bundle, handed to every controller's
/// constructor and to the sampler/loop driver. Spec.md §3 "Lifecycle":
/// constructed once, then immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct AllParameters {
    pub controller_type: String,
    pub execution_type: ExecutionMode,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub direction: f64,
    pub alfa: f64,
    pub beta: f64,
    pub deadzone: f64,
    pub hysteresis_band: f64,
    pub min: f64,
    pub max: f64,
    pub pc: f64,
    pub delta_time: f64,
    pub monitor_time: f64,
    pub set_points: Vec<u64>,
    pub sample_size_per_level: u64,
    pub membership_function: Option<MembershipFamily>,
    pub deffuzification_method: Option<String>,
    pub queue_name: String,
    pub rabbitmq_host: String,
    pub rabbitmq_port: u16,
    pub number_of_clients: usize,
    pub number_of_requests: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub message_size: usize,
    pub output_file: String,
    pub docker_dir: String,
}

impl AllParameters {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RawParameters::from_file(path)?.overlay_env().finish()
    }
}
