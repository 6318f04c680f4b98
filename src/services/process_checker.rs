use regex::Regex;
use sysinfo::System;

/// 命令行匹配到的候选进程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub pid: u32,
    pub parent: Option<u32>,
    pub cmdline: String,
}

/// 进程匹配器，语义与 `pgrep -f` 一致
///
/// 模式作为正则匹配完整命令行（命令行为空时匹配进程名），
/// 正则无效时退化为字符串包含匹配。
pub struct ProcessMatcher {
    pattern: String,
    regex: Option<Regex>,
}

impl ProcessMatcher {
    pub fn new(pattern: &str) -> Self {
        let regex = match Regex::new(pattern) {
            Ok(r) => Some(r),
            Err(e) => {
                log::debug!("Pattern '{}' is not a valid regex ({}), using substring match", pattern, e);
                None
            }
        };
        Self {
            pattern: pattern.to_string(),
            regex,
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(haystack),
            None => haystack.contains(&self.pattern),
        }
    }

    /// 收集所有匹配的进程，排除线程和守护进程自身
    pub fn candidates(&self, sys: &System) -> Vec<Candidate> {
        let own_pid = std::process::id();
        let mut matching = Vec::new();

        for (pid, process) in sys.processes() {
            if pid.as_u32() == own_pid || process.thread_kind().is_some() {
                continue;
            }

            let mut cmdline = process
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            if cmdline.is_empty() {
                cmdline = process.name().to_string_lossy().into_owned();
            }

            if self.is_match(&cmdline) {
                matching.push(Candidate {
                    pid: pid.as_u32(),
                    parent: process.parent().map(|p| p.as_u32()),
                    cmdline,
                });
            }
        }

        matching
    }
}

/// 从多个匹配中选出主进程
///
/// 策略优先级：
/// 1. PPID = 1 的进程（systemd 直接启动）
/// 2. PPID 不在匹配列表中的进程（父进程，非子进程）
/// 3. 最小 PID（通常是最早创建的主进程）
pub fn select_main_process(candidates: &[Candidate]) -> Option<u32> {
    match candidates {
        [] => return None,
        [only] => return Some(only.pid),
        _ => {}
    }

    // 遍历顺序不确定，先按 PID 排序保证结果稳定
    let mut sorted: Vec<&Candidate> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.pid);

    if let Some(c) = sorted.iter().find(|c| c.parent == Some(1)) {
        log::debug!("Found main process (PPID=1): PID {}", c.pid);
        return Some(c.pid);
    }

    let matching_pids: Vec<u32> = sorted.iter().map(|c| c.pid).collect();
    for c in &sorted {
        if let Some(parent_pid) = c.parent {
            if !matching_pids.contains(&parent_pid) {
                log::debug!("Found main process (parent not in group): PID {} (PPID={})", c.pid, parent_pid);
                log::debug!("  CMD: {}", c.cmdline);
                return Some(c.pid);
            }
        }
    }

    let min_pid = sorted.first().map(|c| c.pid);
    log::debug!(
        "Found main process (min PID fallback): PID {:?} from {} matches",
        min_pid,
        candidates.len()
    );
    min_pid
}
