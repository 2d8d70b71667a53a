use anyhow::Result;
use once_cell::sync::Lazy;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    thread,
};

type Task = Box<dyn FnOnce() + Send + 'static>;

static PENDING_TASKS: Lazy<Mutex<HashMap<String, VecDeque<Task>>>> = Lazy::new(Default::default);

/// Runs `f` on a background thread named `task_name`.
///
/// Tasks sharing a name run in submission order on a single thread; a new
/// thread is started only when no thread is currently draining that name.
pub(crate) fn spawn<F: FnOnce() + Send + 'static>(task_name: String, f: F) -> Result<()> {
    {
        let mut pending = PENDING_TASKS.lock().unwrap();
        if let Some(queue) = pending.get_mut(&task_name) {
            queue.push_back(Box::new(f));
            return Ok(());
        }
        pending.insert(task_name.to_owned(), VecDeque::from([Box::new(f) as Task]));
    }

    let queue_name = task_name.to_owned();
    let spawned = thread::Builder::new().name(task_name.to_owned()).spawn(move || {
        while let Some(task) = next_task(&queue_name) {
            task();
        }
    });
    if let Err(err) = spawned {
        PENDING_TASKS.lock().unwrap().remove(&task_name);
        return Err(err.into());
    }
    Ok(())
}

fn next_task(task_name: &str) -> Option<Task> {
    let mut pending = PENDING_TASKS.lock().unwrap();
    let queue = pending.get_mut(task_name)?;
    if let Some(task) = queue.pop_front() {
        return Some(task);
    }
    pending.remove(task_name);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            mpsc::channel,
            Arc, Mutex,
        },
        time::Duration,
    };

    #[test]
    fn test_same_name_tasks_run_in_submission_order() -> Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();
        for i in 0..100usize {
            let order = Arc::clone(&order);
            let tx = tx.clone();
            spawn("ordered-queue".to_owned(), move || {
                order.lock().unwrap().push(i);
                if i == 99 {
                    tx.send(()).unwrap();
                }
            })?;
        }

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*order.lock().unwrap(), (0..100).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_distinct_names_run_independently() -> Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let (tx, rx) = channel();
        for i in 0..4usize {
            let tx = tx.clone();
            spawn(format!("independent-queue-{}", i), move || {
                tx.send(i).unwrap();
            })?;
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        Ok(())
    }
}
