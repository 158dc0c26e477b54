//! # 图片加载线程
//!
//! 单线程、严格 FIFO 的任务队列。任务之间没有优先级，也没有取消原语：
//! 新任务只是排在旧任务之后，最终界面状态由最后完成的任务决定。

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use super::ImportError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// 图片加载执行器。
pub struct ImageLoader {
    sender: Option<Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl ImageLoader {
    pub fn spawn(name: &str) -> Result<Self, ImportError> {
        let (sender, receiver) = mpsc::channel::<Job>();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                log::debug!("🧵 图片加载线程启动");
                while let Ok(job) = receiver.recv() {
                    job();
                }
                log::debug!("🧵 图片加载线程退出");
            })
            .map_err(|e| ImportError::WorkerUnavailable(format!("创建图片加载线程失败：{}", e)))?;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// 提交任务，按提交顺序执行。
    pub fn execute<F>(&self, job: F) -> Result<(), ImportError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ImportError::WorkerUnavailable("任务队列已关闭".to_string()))?;

        sender
            .send(Box::new(job))
            .map_err(|_| ImportError::WorkerUnavailable("图片加载线程已退出".to_string()))
    }

    /// 关闭队列并等待已排队任务执行完毕。
    pub fn shutdown(mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("⚠️ 图片加载线程异常退出");
            }
        }
    }
}

impl Drop for ImageLoader {
    /// 只断开队列，不等待线程。
    fn drop(&mut self) {
        self.sender.take();
    }
}
