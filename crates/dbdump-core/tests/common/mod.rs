pub mod fake_ssh;
