//! Shell-`tc`-via-`ip netns exec` actuation, following
//! `netns-testbench::qdisc::QdiscManager`'s command construction.

use crate::error::ProgrammerError;
use tokio::process::Command;

pub async fn run_tc(ns: &str, iface: &str, args: &[String]) -> Result<(), ProgrammerError> {
    let mut cmd = Command::new("ip");
    cmd.arg("netns").arg("exec").arg(ns).arg("tc");
    for arg in args {
        cmd.arg(arg);
    }
    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(ProgrammerError::TcFailed {
            ns: ns.to_string(),
            iface: iface.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

pub fn netem_args(delay_ms: f64, jitter_ms: f64, loss_percent: f64, rate_mbps: f64) -> Vec<String> {
    let mut args = vec!["netem".to_string()];
    if delay_ms > 0.0 {
        args.push("delay".to_string());
        args.push(format!("{delay_ms}ms"));
        if jitter_ms > 0.0 {
            args.push(format!("{jitter_ms}ms"));
        }
    }
    if loss_percent > 0.0 {
        args.push("loss".to_string());
        args.push(format!("{loss_percent}%"));
    }
    if rate_mbps > 0.0 {
        args.push("rate".to_string());
        args.push(format!("{}kbit", (rate_mbps * 1000.0) as u64));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netem_args_include_all_nonzero_params() {
        let args = netem_args(10.0, 2.0, 0.5, 100.0);
        assert!(args.contains(&"delay".to_string()));
        assert!(args.contains(&"10ms".to_string()));
        assert!(args.contains(&"2ms".to_string()));
        assert!(args.contains(&"loss".to_string()));
        assert!(args.contains(&"0.5%".to_string()));
        assert!(args.contains(&"rate".to_string()));
        assert!(args.contains(&"100000kbit".to_string()));
    }

    #[test]
    fn netem_args_skip_zero_jitter() {
        let args = netem_args(10.0, 0.0, 0.0, 0.0);
        assert_eq!(args, vec!["netem", "delay", "10ms"]);
    }
}
