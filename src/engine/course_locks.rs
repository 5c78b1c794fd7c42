// ==========================================
// 课程指标缓存引擎 - 课程级互斥锁
// ==========================================
// 红线: 同一课程的 {读关联 → 修改 → 重算 → 持久化} 必须串行
// 说明: 不同课程之间互不阻塞
// ==========================================

use crate::engine::error::{MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 按课程 ID 分配的互斥锁表
#[derive(Default)]
pub struct CourseLockRegistry {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl CourseLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, course_id: i64) -> MetricsResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|e| MetricsError::LockError {
            course_id,
            message: e.to_string(),
        })?;
        Ok(Arc::clone(
            locks
                .entry(course_id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// 在课程锁内执行闭包
    ///
    /// 闭包内不得再次获取同一课程的锁
    pub fn with_course<T>(
        &self,
        course_id: i64,
        f: impl FnOnce() -> MetricsResult<T>,
    ) -> MetricsResult<T> {
        let lock = self.lock_for(course_id)?;
        let _guard = lock.lock().map_err(|e| MetricsError::LockError {
            course_id,
            message: e.to_string(),
        })?;
        f()
    }

    /// 已分配锁的课程数
    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().map(|l| l.len()).expect("lock table poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_course_is_serialized() {
        let registry = Arc::new(CourseLockRegistry::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                thread::spawn(move || {
                    registry
                        .with_course(7, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(5));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(registry.lock_count(), 1);
    }

    #[test]
    fn test_errors_pass_through() {
        let registry = CourseLockRegistry::new();
        let result: MetricsResult<()> =
            registry.with_course(3, || Err(MetricsError::CourseNotFound { course_id: 3 }));
        assert!(matches!(result, Err(MetricsError::CourseNotFound { course_id: 3 })));
    }
}
