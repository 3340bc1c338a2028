// ==========================================
// 手术室排程系统 - 通知分发队列
// ==========================================
// 职责: 有界队列 + 专属 worker 任务的通知分发
// 说明: 分发是提交后的尽力而为副作用, 队列满或投递失败只记日志，
//       从不向调用方抛错，更不回滚已提交的排班决定
// 优先级: 只影响投递顺序，不影响成败
// 关停: 关闭队列后 worker 把剩余消息投递完再退出
// ==========================================

use crate::domain::types::{NotifyChannel, NotifyPriority};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// Notification - 通知消息
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,      // 通知ID
    pub recipient: String,            // 接收人标识
    pub subject: String,              // 标题
    pub body: String,                 // 正文
    pub channel: NotifyChannel,       // 渠道
    pub priority: NotifyPriority,     // 优先级（仅影响投递顺序）
    pub metadata: serde_json::Value,  // 附加元数据
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        channel: NotifyChannel,
        priority: NotifyPriority,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4().to_string(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            channel,
            priority,
            metadata,
        }
    }
}

// ==========================================
// NotificationSender - 投递通道 Trait
// ==========================================

/// 通知投递通道（外部传输由适配器实现）
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 投递一条通知
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// 日志投递通道
///
/// 默认实现: 把通知写入结构化日志（真实传输是外部协作方）
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            notification_id = %notification.notification_id,
            recipient = %notification.recipient,
            channel = %notification.channel,
            priority = %notification.priority,
            subject = %notification.subject,
            "通知投递"
        );
        Ok(())
    }
}

// ==========================================
// worker 内部的优先级排序包装
// ==========================================
// BinaryHeap 是大顶堆: 优先级序号小者（更紧急）排前，
// 同优先级按入队顺序先进先出
struct QueuedNotification {
    seq: u64,
    notification: Notification,
}

impl PartialEq for QueuedNotification {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedNotification {}

impl PartialOrd for QueuedNotification {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNotification {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let self_rank = self.notification.priority.rank();
        let other_rank = other.notification.priority.rank();
        other_rank
            .cmp(&self_rank)
            .then(other.seq.cmp(&self.seq))
    }
}

// ==========================================
// NotificationDispatcher - 通知分发器
// ==========================================
// 由组合根显式构造并注入，不做进程级单例
pub struct NotificationDispatcher {
    tx: Mutex<Option<mpsc::Sender<Notification>>>,
    worker: Mutex<Option<JoinHandle<u64>>>,
}

impl NotificationDispatcher {
    /// 启动分发器
    ///
    /// # 参数
    /// - capacity: 队列容量（有界）
    /// - sender: 投递通道
    pub fn start(capacity: usize, sender: Box<dyn NotificationSender>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));

        let worker = tokio::spawn(async move {
            let mut heap: BinaryHeap<QueuedNotification> = BinaryHeap::new();
            let mut intake_seq: u64 = 0;
            let mut delivered: u64 = 0;
            let mut channel_open = true;

            loop {
                // 队列空时阻塞等待下一条；随后把已就绪的消息一并吸入，
                // 按优先级决定投递顺序
                if channel_open && heap.is_empty() {
                    match rx.recv().await {
                        Some(n) => {
                            heap.push(QueuedNotification {
                                seq: intake_seq,
                                notification: n,
                            });
                            intake_seq += 1;
                        }
                        None => channel_open = false,
                    }
                }
                if channel_open {
                    while let Ok(n) = rx.try_recv() {
                        heap.push(QueuedNotification {
                            seq: intake_seq,
                            notification: n,
                        });
                        intake_seq += 1;
                    }
                }

                match heap.pop() {
                    Some(queued) => {
                        if let Err(e) = sender.send(&queued.notification).await {
                            // 投递失败只记日志（尽力而为）
                            warn!(
                                notification_id = %queued.notification.notification_id,
                                recipient = %queued.notification.recipient,
                                error = %e,
                                "通知投递失败"
                            );
                        } else {
                            delivered += 1;
                        }
                    }
                    None if !channel_open => break,
                    None => {}
                }
            }

            info!(delivered, "通知 worker 已退出");
            delivered
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 入队一条通知（非阻塞，尽力而为）
    ///
    /// # 返回
    /// - true: 已入队
    /// - false: 队列已满 / 分发器已关停（只记日志，不影响调用方）
    pub fn enqueue(&self, notification: Notification) -> bool {
        let guard = match self.tx.lock() {
            Ok(g) => g,
            Err(e) => {
                warn!(error = %e, "通知队列锁获取失败，丢弃通知");
                return false;
            }
        };

        match guard.as_ref() {
            Some(tx) => match tx.try_send(notification) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(n)) => {
                    warn!(
                        notification_id = %n.notification_id,
                        recipient = %n.recipient,
                        "通知队列已满，丢弃通知"
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(n)) => {
                    warn!(
                        notification_id = %n.notification_id,
                        "通知分发器已关停，丢弃通知"
                    );
                    false
                }
            },
            None => {
                debug!("通知分发器已关停，丢弃通知");
                false
            }
        }
    }

    /// 优雅关停: 关闭队列并等待 worker 把剩余消息投递完
    ///
    /// # 返回
    /// 已投递的通知总数
    pub async fn shutdown(&self) -> u64 {
        let tx = match self.tx.lock() {
            Ok(mut g) => g.take(),
            Err(_) => None,
        };
        drop(tx);

        let worker = match self.worker.lock() {
            Ok(mut g) => g.take(),
            Err(_) => None,
        };

        match worker {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "通知 worker 非正常退出");
                0
            }),
            None => 0,
        }
    }
}
